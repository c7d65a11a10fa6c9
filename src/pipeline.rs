//! The observation pipeline.
//!
//! Every accepted observation is split into TLV blocks, decoded, handed to the
//! attached sink and recorded in the device registry.

use crate::advertisement;
use crate::decoder::{DecodedReading, Decoder};
use crate::mac_address::MacAddress;
use crate::observation::Observation;
use crate::registry::DeviceRegistry;
use crate::sink::ObservationSink;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// An observation together with both of its views.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedObservation {
    pub observation: Observation,
    /// Hex view of the advertisement blocks
    pub hex_view: String,
    pub reading: DecodedReading,
}

pub struct Pipeline {
    registry: Arc<DeviceRegistry>,
    decoder: Decoder,
    sink: Option<Box<dyn ObservationSink>>,
    filter: Option<BTreeSet<MacAddress>>,
}

impl Pipeline {
    pub fn new(registry: Arc<DeviceRegistry>, decoder: Decoder) -> Self {
        Self {
            registry,
            decoder,
            sink: None,
            filter: None,
        }
    }

    /// Only accept observations from `addresses`; an empty list accepts everything.
    pub fn with_filter(mut self, addresses: impl IntoIterator<Item = MacAddress>) -> Self {
        let addresses: BTreeSet<MacAddress> = addresses.into_iter().collect();
        self.filter = (!addresses.is_empty()).then_some(addresses);
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Attach a sink, returning the previously attached one.
    pub fn attach_sink(
        &mut self,
        sink: Box<dyn ObservationSink>,
    ) -> Option<Box<dyn ObservationSink>> {
        self.sink.replace(sink)
    }

    pub fn detach_sink(&mut self) -> Option<Box<dyn ObservationSink>> {
        self.sink.take()
    }

    /// Start a new observation session: forget every known device.
    pub fn start_session(&self) {
        self.registry.clear();
    }

    pub fn accepts(&self, address: &MacAddress) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|allowed| allowed.contains(address))
    }

    /// Build both views of an observation without recording it anywhere.
    pub fn describe(&self, observation: Observation) -> ProcessedObservation {
        let hex_view = advertisement::parse(&observation.raw_payload).hex_view;
        let reading = self.decoder.decode(
            &observation.address,
            advertisement::payload_slice(&observation.raw_payload),
        );
        ProcessedObservation {
            observation,
            hex_view,
            reading,
        }
    }

    /// Run one observation through the pipeline.
    ///
    /// Returns `None` if the address filter rejects it. Sink failures are
    /// logged and otherwise ignored.
    pub fn process(&mut self, observation: Observation) -> Option<ProcessedObservation> {
        if !self.accepts(&observation.address) {
            return None;
        }

        let processed = self.describe(observation);

        if let Some(sink) = self.sink.as_mut()
            && let Err(error) = sink.record_processed(&processed)
        {
            warn!(address = %processed.observation.address, %error, "failed to record observation");
        }

        self.registry.upsert(processed.observation.clone());
        Some(processed)
    }

    /// Live registry entries with their views, in registry order.
    pub fn snapshot(&self) -> Vec<ProcessedObservation> {
        self.registry
            .list()
            .into_iter()
            .map(|entry| self.describe(entry.latest))
            .collect()
    }
}
