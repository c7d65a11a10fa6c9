use crate::decoder::MULTI_SENSOR_SENTINEL;
use crate::mac_address::MacAddress;
use crate::observation::Observation;

/// A stable address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

/// Flags block preceding the payload slice in test advertisements.
pub const FLAGS_HEADER: [u8; 3] = [0x02, 0x01, 0x06];

/// Build an `Observation` without a name and with a fixed RSSI.
///
/// Tests can override just the fields they care about.
pub fn observation(address: MacAddress, timestamp: u64, raw_payload: Vec<u8>) -> Observation {
    Observation {
        address,
        name: None,
        rssi: -60,
        timestamp,
        raw_payload,
    }
}

/// Address whose last octet is `n`, for multi-device tests.
pub fn mac(n: u8) -> MacAddress {
    MacAddress::from([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, n])
}

/// Pack humidity and temperature the way the beacons do.
fn pack_climate(temperature_raw: u16, humidity_raw: u16) -> [u8; 3] {
    [
        (humidity_raw & 0xFF) as u8,
        (((humidity_raw >> 8) & 0x03) | ((temperature_raw & 0x3F) << 2)) as u8,
        (temperature_raw >> 6) as u8,
    ]
}

/// A 7-byte legacy sensor payload slice.
pub fn legacy_slice(raw_timestamp: u32, temperature_raw: u16, humidity_raw: u16) -> Vec<u8> {
    let mut slice = raw_timestamp.to_le_bytes().to_vec();
    slice.extend_from_slice(&pack_climate(temperature_raw, humidity_raw));
    slice
}

/// A full 14-byte multi-sensor payload slice.
pub fn multi_sensor_slice(
    message_type: u8,
    temperature_raw: u16,
    humidity_raw: u16,
    light_raw: u16,
    [x, y, z]: [u16; 3],
) -> Vec<u8> {
    let mut slice = MULTI_SENSOR_SENTINEL.to_le_bytes().to_vec();
    slice.push(message_type);
    slice.extend_from_slice(&pack_climate(temperature_raw, humidity_raw));
    slice.extend_from_slice(&light_raw.to_le_bytes());
    slice.push((x & 0xFF) as u8);
    slice.push((((x >> 8) & 0x03) | ((y & 0x3F) << 2)) as u8);
    slice.push((((y >> 6) & 0x0F) | ((z & 0x0F) << 4)) as u8);
    slice.push((z >> 4) as u8);
    slice
}

/// A complete advertisement: flags header followed by `slice`.
pub fn advertisement(slice: &[u8]) -> Vec<u8> {
    let mut raw = FLAGS_HEADER.to_vec();
    raw.extend_from_slice(slice);
    raw
}
