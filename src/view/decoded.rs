//! Decoded sensor view.

use crate::decoder::{Acceleration, DecodedReading};
use crate::pipeline::ProcessedObservation;
use crate::view::{NO_NAME, ObservationFormatter};

/// Shown when the advertisement carried no payload.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when the payload was too short for its format.
pub const ERROR: &str = "err";

/// Renders decoded readings, one device per line.
///
/// The name comes from the payload format when it implies one (identity
/// profile, legacy meeting-room sensor, multi-sensor card), otherwise from the
/// advertised name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodedFormatter;

fn temperature(celsius: f64) -> String {
    format!("{celsius:+7.2} °C")
}

fn humidity(percent: f64) -> String {
    format!("{percent:5.1} %RH")
}

fn acceleration(acc: &Acceleration) -> String {
    format!("X:{:.2} g Y:{:.2} g Z:{:.2} g", acc.x, acc.y, acc.z)
}

/// Render the reading-specific part of the line.
pub fn reading_fields(reading: &DecodedReading) -> String {
    let mut fields = match reading {
        DecodedReading::Identity { .. } => return "identity card".to_string(),
        DecodedReading::LegacySensor {
            temperature_celsius,
            humidity_percent,
            ..
        } => vec![
            temperature(*temperature_celsius),
            humidity(*humidity_percent),
        ],
        DecodedReading::MultiSensor {
            temperature_celsius,
            humidity_percent,
            illuminance_lux,
            acceleration_g,
            ..
        } => {
            let mut fields = Vec::new();
            fields.extend(temperature_celsius.map(temperature));
            fields.extend(humidity_percent.map(humidity));
            fields.extend(illuminance_lux.map(|lux| format!("{lux:.1} lx")));
            fields.extend(acceleration_g.as_ref().map(acceleration));
            fields
        }
        DecodedReading::Unrecognized => return NOT_AVAILABLE.to_string(),
        DecodedReading::Malformed(reason) => return format!("{ERROR} ({reason})"),
    };
    fields.extend(reading.raw_timestamp().map(|ts| format!("time={ts:08x}")));
    fields.join(" ")
}

impl ObservationFormatter for DecodedFormatter {
    fn format(&self, processed: &ProcessedObservation) -> String {
        let obs = &processed.observation;
        let name = processed
            .reading
            .display_name()
            .or(obs.name.as_deref())
            .unwrap_or(NO_NAME);
        format!(
            "{name} - {} rssi={} t={}: {}",
            obs.address,
            obs.rssi,
            obs.timestamp,
            reading_fields(&processed.reading)
        )
    }
}
