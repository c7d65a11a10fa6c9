//! Durable sinks for accepted observations.
//!
//! The pipeline hands every accepted observation to the attached sink. Sinks
//! report failures to the caller, which logs them and carries on; a sink is
//! never retried and never holds up the registry.

pub mod csv;

use crate::decoder::DecodedReading;
use crate::observation::Observation;
use crate::pipeline::ProcessedObservation;
use std::io;

/// Receiver of every accepted observation.
pub trait ObservationSink: Send {
    /// Record one observation together with its decoded reading, if any.
    ///
    /// # Errors
    /// Returns the underlying I/O error; callers log and ignore it.
    fn record(&mut self, obs: &Observation, decoded: Option<&DecodedReading>) -> io::Result<()>;

    /// Record an observation the pipeline has already described.
    ///
    /// Sinks that render the hex view can reuse it instead of parsing the
    /// payload again.
    fn record_processed(&mut self, processed: &ProcessedObservation) -> io::Result<()> {
        self.record(&processed.observation, Some(&processed.reading))
    }
}
