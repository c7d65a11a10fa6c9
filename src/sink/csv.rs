//! Delimited text sink.
//!
//! One `;`-separated row per observation, preceded by a header row when the
//! session starts:
//!
//! ```text
//! time;address;RSSI;data;name
//! 1234567890;18:04:ED:61:66:3D;-67;020106,abababab03f4813ed204;NA
//! ```

use crate::advertisement;
use crate::decoder::DecodedReading;
use crate::observation::Observation;
use crate::pipeline::ProcessedObservation;
use crate::sink::ObservationSink;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Field delimiter.
pub const DELIMITER: char = ';';

/// Placeholder for absent fields.
pub const NOT_AVAILABLE: &str = "NA";

/// Header row written at the start of every session.
pub const HEADER: &str = "time;address;RSSI;data;name";

/// One data row of the log.
#[derive(Debug, PartialEq)]
pub struct Row<'a> {
    pub timestamp: u64,
    pub address: String,
    pub rssi: i32,
    pub data: Option<String>,
    pub name: Option<&'a str>,
}

impl<'a> Row<'a> {
    pub fn from_observation(obs: &'a Observation) -> Self {
        let hex_view = advertisement::parse(&obs.raw_payload).hex_view;
        Self::with_hex_view(obs, &hex_view)
    }

    /// Build a row from an already rendered hex view of `obs.raw_payload`.
    pub fn with_hex_view(obs: &'a Observation, hex_view: &str) -> Self {
        Row {
            timestamp: obs.timestamp,
            address: obs.address.to_string(),
            rssi: obs.rssi,
            data: (!hex_view.is_empty()).then(|| hex_view.to_string()),
            name: obs.name.as_deref(),
        }
    }
}

/// Keep a free-text field on one row.
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.timestamp,
            self.address,
            self.rssi,
            self.data.as_deref().unwrap_or(NOT_AVAILABLE),
            self.name.map_or(Cow::Borrowed(NOT_AVAILABLE), single_line),
        )
    }
}

/// Sink writing the delimited text log to any writer.
pub struct CsvSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> CsvSink<W> {
    /// Start a session on `writer`, writing the header row.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{HEADER}")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) the log file at `path` and start a session.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path: PathBuf = path.as_ref().into();
        let file = File::create(&path)?;
        let sink = Self::new(BufWriter::new(file))?;
        info!(path = %path.display(), "opened log file");
        Ok(sink)
    }
}

impl<W: Write + Send> ObservationSink for CsvSink<W> {
    fn record(&mut self, obs: &Observation, _decoded: Option<&DecodedReading>) -> io::Result<()> {
        writeln!(self.writer, "{}", Row::from_observation(obs))?;
        self.writer.flush()
    }

    fn record_processed(&mut self, processed: &ProcessedObservation) -> io::Result<()> {
        let row = Row::with_hex_view(&processed.observation, &processed.hex_view);
        writeln!(self.writer, "{row}")?;
        self.writer.flush()
    }
}
