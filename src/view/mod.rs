//! Text views of processed observations.
//!
//! This module provides a trait for rendering observations and the two views
//! consumers can choose between: the raw diagnostic view (advertisement bytes)
//! and the decoded sensor view.

pub mod decoded;
pub mod raw;

use crate::pipeline::ProcessedObservation;
use std::fmt;

/// Shown when a device advertises no name.
pub const NO_NAME: &str = "{no name}";

/// Trait for rendering an observation as one line of text.
pub trait ObservationFormatter: Send + Sync {
    /// Render a processed observation (without trailing newline).
    fn format(&self, processed: &ProcessedObservation) -> String;
}

/// Available views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewKind {
    /// Advertisement bytes as hex blocks
    Raw,
    /// Decoded sensor readings
    #[default]
    Decoded,
}

impl ViewKind {
    pub fn formatter(self) -> Box<dyn ObservationFormatter> {
        match self {
            ViewKind::Raw => Box::new(raw::RawFormatter),
            ViewKind::Decoded => Box::new(decoded::DecodedFormatter),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Raw => write!(f, "raw"),
            ViewKind::Decoded => write!(f, "decoded"),
        }
    }
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(ViewKind::Raw),
            "decoded" | "decode" => Ok(ViewKind::Decoded),
            _ => Err(format!("Unknown view: {}", s)),
        }
    }
}

/// Render every entry on its own line, newline-terminated.
pub fn render_table(formatter: &dyn ObservationFormatter, rows: &[ProcessedObservation]) -> String {
    rows.iter()
        .map(|row| formatter.format(row) + "\n")
        .collect()
}
