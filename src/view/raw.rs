//! Raw diagnostic view.

use crate::pipeline::ProcessedObservation;
use crate::view::{NO_NAME, ObservationFormatter};

/// Renders the advertisement bytes untouched by the decoder.
///
/// `{name} {address} rssi={rssi} t={timestamp} data={hex view}`
#[derive(Debug, Default, Clone, Copy)]
pub struct RawFormatter;

impl ObservationFormatter for RawFormatter {
    fn format(&self, processed: &ProcessedObservation) -> String {
        let obs = &processed.observation;
        let data = if processed.hex_view.is_empty() {
            "{no data}"
        } else {
            &processed.hex_view
        };
        format!(
            "{} {} rssi={} t={} data={}",
            obs.name.as_deref().unwrap_or(NO_NAME),
            obs.address,
            obs.rssi,
            obs.timestamp,
            data
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedReading;
    use crate::test_utils::{TEST_MAC, observation};

    #[test]
    fn test_raw_view() {
        let mut obs = observation(TEST_MAC, 42, vec![]);
        obs.name = Some("Beacon".into());
        let processed = ProcessedObservation {
            observation: obs,
            hex_view: "020106,03ff9904".into(),
            reading: DecodedReading::Unrecognized,
        };

        assert_eq!(
            RawFormatter.format(&processed),
            "Beacon AA:BB:CC:DD:EE:FF rssi=-60 t=42 data=020106,03ff9904"
        );
    }

    #[test]
    fn test_raw_view_without_name_or_data() {
        let processed = ProcessedObservation {
            observation: observation(TEST_MAC, 1, vec![]),
            hex_view: String::new(),
            reading: DecodedReading::Unrecognized,
        };

        assert_eq!(
            RawFormatter.format(&processed),
            "{no name} AA:BB:CC:DD:EE:FF rssi=-60 t=1 data={no data}"
        );
    }
}
