//! Sensor payload decoding.
//!
//! The payload slice starts with a 4-byte little-endian field the beacon
//! firmware fills with a sentinel selecting the payload format. Identity cards
//! and multi-sensor cards use fixed sentinels; any other value is the
//! timestamp of a legacy single-sensor beacon.
//!
//! All bit layouts below are wire contracts of the beacons:
//!
//! ```text
//! legacy:  [ts0 ts1 ts2 ts3] [rh 7:0] [t 5:0 | rh 9:8] [t 13:6]
//! multi:   [ts0 ts1 ts2 ts3] [type] [rh 7:0] [t 5:0 | rh 9:8] [t 13:6]
//!          [lux 7:0] [lux 15:8] [x 7:0] [y 5:0 | x 9:8] [z 3:0 | y 9:6] [z 11:4]
//! ```

use crate::mac_address::MacAddress;
use crate::profile::{self, ProfileMap};
use std::fmt;
use thiserror::Error;

/// Sentinel of identity (profile) cards.
pub const IDENTITY_SENTINEL: u32 = 0xFDFC_FBFA;

/// Sentinel of multi-sensor cards.
pub const MULTI_SENSOR_SENTINEL: u32 = 0xABAB_ABAB;

/// Multi-sensor message type bit: temperature and relative humidity present.
pub const TEMP_RH: u8 = 0x01;
/// Multi-sensor message type bit: illuminance present.
pub const LIGHT: u8 = 0x02;
/// Multi-sensor message type bit: acceleration present.
pub const ACC: u8 = 0x04;
/// All multi-sensor fields present.
pub const ALL: u8 = 0xFF;

/// Slices shorter than this never carry a decodable payload.
const MIN_SLICE_LEN: usize = 6;
const LEGACY_LEN: usize = 7;
const TEMP_RH_END: usize = 8;
const LIGHT_END: usize = 10;
const ACC_END: usize = 14;

/// Payload format selected by the sentinel field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Identity,
    MultiSensor,
    LegacySensor,
}

impl PayloadFormat {
    pub fn from_sentinel(raw_timestamp: u32) -> Self {
        match raw_timestamp {
            IDENTITY_SENTINEL => PayloadFormat::Identity,
            MULTI_SENSOR_SENTINEL => PayloadFormat::MultiSensor,
            _ => PayloadFormat::LegacySensor,
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Identity => write!(f, "identity"),
            PayloadFormat::MultiSensor => write!(f, "multi-sensor"),
            PayloadFormat::LegacySensor => write!(f, "legacy sensor"),
        }
    }
}

/// Reason a payload could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Not even the sentinel and one data byte are present
    #[error("payload too short: {0} bytes")]
    TooShort(usize),
    /// The selected format needs more bytes than were received
    #[error("truncated {format} payload: need {needed} bytes, got {actual}")]
    Truncated {
        format: PayloadFormat,
        needed: usize,
        actual: usize,
    },
}

/// Acceleration vector in g.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Structured result of decoding one payload slice.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedReading {
    /// Identity card; carries no sensor data
    Identity { profile_label: String },
    /// Single temperature/humidity sensor using the legacy layout
    LegacySensor {
        temperature_celsius: f64,
        humidity_percent: f64,
        raw_timestamp: u32,
    },
    /// Card with a message-type bitmask; unset fields are `None`
    MultiSensor {
        temperature_celsius: Option<f64>,
        humidity_percent: Option<f64>,
        illuminance_lux: Option<f64>,
        acceleration_g: Option<Acceleration>,
        raw_timestamp: u32,
    },
    /// No payload slice could be taken from the advertisement
    Unrecognized,
    /// A payload was present but too short for its format
    Malformed(DecodeError),
}

impl DecodedReading {
    /// Display name implied by the payload format, if any.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            DecodedReading::Identity { profile_label } => Some(profile_label.as_str()),
            DecodedReading::LegacySensor { .. } => Some("Meeting Room"),
            DecodedReading::MultiSensor { .. } => Some(profile::DEFAULT_PROFILE_LABEL),
            DecodedReading::Unrecognized | DecodedReading::Malformed(_) => None,
        }
    }

    /// Sentinel/timestamp field of sensor readings.
    pub fn raw_timestamp(&self) -> Option<u32> {
        match self {
            DecodedReading::LegacySensor { raw_timestamp, .. }
            | DecodedReading::MultiSensor { raw_timestamp, .. } => Some(*raw_timestamp),
            _ => None,
        }
    }
}

fn temperature_celsius(raw: u16) -> f64 {
    -40.0 + f64::from(raw) / 100.0
}

fn humidity_percent(raw: u16) -> f64 {
    f64::from(raw) / 10.0
}

fn illuminance_lux(raw: u16) -> f64 {
    f64::from(raw) / 10.0
}

fn acceleration_g(raw: u16) -> f64 {
    -2.0 + f64::from(raw) / 100.0
}

/// Decode humidity (10 bits) and temperature (14 bits) packed into three bytes.
fn climate(bytes: &[u8]) -> (f64, f64) {
    let humidity_raw = u16::from(bytes[0]) | (u16::from(bytes[1] & 0x03) << 8);
    let temperature_raw = (u16::from(bytes[1] & 0xFC) >> 2) | (u16::from(bytes[2]) << 6);
    (
        temperature_celsius(temperature_raw),
        humidity_percent(humidity_raw),
    )
}

fn acceleration(bytes: &[u8]) -> Acceleration {
    let x = u16::from(bytes[0]) | (u16::from(bytes[1] & 0x03) << 8);
    let y = (u16::from(bytes[1]) >> 2) | (u16::from(bytes[2] & 0x0F) << 6);
    let z = (u16::from(bytes[2]) >> 4) | (u16::from(bytes[3]) << 4);
    Acceleration {
        x: acceleration_g(x),
        y: acceleration_g(y),
        z: acceleration_g(z),
    }
}

fn require(format: PayloadFormat, slice: &[u8], needed: usize) -> Result<(), DecodeError> {
    if slice.len() < needed {
        return Err(DecodeError::Truncated {
            format,
            needed,
            actual: slice.len(),
        });
    }
    Ok(())
}

/// Decoder for beacon payload slices.
///
/// Holds the identity allow-list; everything else is stateless.
#[derive(Debug, Clone)]
pub struct Decoder {
    profiles: ProfileMap,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(profile::builtin_profiles())
    }
}

impl Decoder {
    pub fn new(profiles: ProfileMap) -> Self {
        Self { profiles }
    }

    /// Decode a payload slice received from `address`.
    ///
    /// Never fails: an absent slice yields [`DecodedReading::Unrecognized`],
    /// a short one [`DecodedReading::Malformed`].
    pub fn decode(&self, address: &MacAddress, slice: Option<&[u8]>) -> DecodedReading {
        let Some(slice) = slice else {
            return DecodedReading::Unrecognized;
        };
        if slice.len() < MIN_SLICE_LEN {
            return DecodedReading::Malformed(DecodeError::TooShort(slice.len()));
        }

        let raw_timestamp = u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]);
        let result = match PayloadFormat::from_sentinel(raw_timestamp) {
            PayloadFormat::Identity => Ok(DecodedReading::Identity {
                profile_label: profile::resolve_label(address, &self.profiles).to_string(),
            }),
            PayloadFormat::MultiSensor => decode_multi_sensor(slice, raw_timestamp),
            PayloadFormat::LegacySensor => decode_legacy(slice, raw_timestamp),
        };

        result.unwrap_or_else(DecodedReading::Malformed)
    }
}

fn decode_legacy(slice: &[u8], raw_timestamp: u32) -> Result<DecodedReading, DecodeError> {
    require(PayloadFormat::LegacySensor, slice, LEGACY_LEN)?;
    let (temperature_celsius, humidity_percent) = climate(&slice[4..7]);
    Ok(DecodedReading::LegacySensor {
        temperature_celsius,
        humidity_percent,
        raw_timestamp,
    })
}

fn decode_multi_sensor(slice: &[u8], raw_timestamp: u32) -> Result<DecodedReading, DecodeError> {
    let format = PayloadFormat::MultiSensor;
    let message_type = slice[4];

    let (temperature_celsius, humidity_percent) = if message_type & TEMP_RH == TEMP_RH {
        require(format, slice, TEMP_RH_END)?;
        let (t, rh) = climate(&slice[5..8]);
        (Some(t), Some(rh))
    } else {
        (None, None)
    };

    let illuminance_lux = if message_type & LIGHT == LIGHT {
        require(format, slice, LIGHT_END)?;
        Some(illuminance_lux(u16::from_le_bytes([slice[8], slice[9]])))
    } else {
        None
    };

    let acceleration_g = if message_type & ACC == ACC {
        require(format, slice, ACC_END)?;
        Some(acceleration(&slice[10..14]))
    } else {
        None
    };

    Ok(DecodedReading::MultiSensor {
        temperature_celsius,
        humidity_percent,
        illuminance_lux,
        acceleration_g,
        raw_timestamp,
    })
}
