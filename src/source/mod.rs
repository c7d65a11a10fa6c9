//! Capture source abstraction.
//!
//! Observations reach the pipeline through a [`CaptureSource`], which hands back
//! a channel of observation results. The only built-in source replays a
//! previously written delimited text log; radio scanning is left to the host.

pub mod replay;

use crate::observation::Observation;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;

pub use replay::{Input, ReplaySource};

/// A capture record that could not be turned into an observation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Wrong number of delimited fields
    #[error("line {line}: expected 5 fields, found {found}")]
    FieldCount { line: usize, found: usize },
    /// A field is present but unusable
    #[error("line {line}: invalid {field}: {reason}")]
    InvalidField {
        line: usize,
        field: &'static str,
        reason: String,
    },
}

/// Convenience alias for captured observations or capture errors.
pub type ObservationResult = Result<Observation, CaptureError>;

/// Error type for starting a capture source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot open capture log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Channel buffer size for observation results.
pub const OBSERVATION_CHANNEL_BUFFER_SIZE: usize = 100;

/// Source of observations, so the run loop can be driven without a radio.
pub trait CaptureSource: Send + Sync {
    /// Start delivering observations.
    ///
    /// Capture errors are only sent when `verbose` is set; otherwise bad
    /// records are skipped. The channel closes when the source is exhausted.
    fn start(
        &self,
        verbose: bool,
    ) -> Pin<
        Box<
            dyn Future<Output = Result<mpsc::Receiver<ObservationResult>, SourceError>>
                + Send
                + '_,
        >,
    >;
}
