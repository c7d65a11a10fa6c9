//! Beacon observation data structure and the capture clock.

use crate::mac_address::MacAddress;
use std::sync::OnceLock;
use std::time::Instant;

/// RSSI value reported when the capture source does not know the signal strength.
pub const RSSI_UNKNOWN: i32 = 999;

/// One received advertisement.
///
/// Observations are never mutated: a later advertisement from the same device
/// is a new `Observation` that replaces the old one in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Hardware address of the advertising device
    pub address: MacAddress,
    /// Advertised device name, if any
    pub name: Option<String>,
    /// Received signal strength in dBm, [`RSSI_UNKNOWN`] when not available
    pub rssi: i32,
    /// Capture instant in nanoseconds on the process monotonic clock
    pub timestamp: u64,
    /// Advertisement bytes as received
    pub raw_payload: Vec<u8>,
}

impl Observation {
    /// Create an observation stamped with the current monotonic time.
    pub fn now(address: MacAddress, name: Option<String>, rssi: i32, raw_payload: Vec<u8>) -> Self {
        Self {
            address,
            name,
            rssi,
            timestamp: monotonic_nanos(),
            raw_payload,
        }
    }
}

fn clock_origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

/// Nanoseconds elapsed on the process monotonic clock.
///
/// Values are only comparable within one process run. The clock never returns
/// zero, since a zero timestamp marks an observation as never aging out.
pub fn monotonic_nanos() -> u64 {
    let elapsed = clock_origin().elapsed().as_nanos();
    u64::try_from(elapsed).unwrap_or(u64::MAX).max(1)
}
