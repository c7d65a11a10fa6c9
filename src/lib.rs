//! `beacon-logger` library.
//!
//! Splits BLE advertisements into TLV blocks, decodes the beacon payload
//! formats and keeps a registry of recently seen devices.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, logging setup and
//! process exit codes. The run loop lives in [`crate::app`] where it can be
//! tested with an injected capture source and injected output streams.

pub mod advertisement;
pub mod app;
pub mod decoder;
pub mod duration;
pub mod mac_address;
pub mod observation;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod sink;
pub mod source;
pub mod view;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use advertisement::{Advertisement, TlvBlock, payload_slice};
pub use decoder::{DecodeError, DecodedReading, Decoder, PayloadFormat};
pub use mac_address::MacAddress;
pub use observation::{Observation, RSSI_UNKNOWN, monotonic_nanos};
pub use pipeline::{Pipeline, ProcessedObservation};
pub use profile::{Profile, ProfileMap, parse_profile};
pub use registry::{DeviceRegistry, RegistryEntry};
pub use sink::ObservationSink;
pub use sink::csv::CsvSink;
pub use source::{CaptureError, CaptureSource, ObservationResult, ReplaySource, SourceError};
