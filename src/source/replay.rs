//! Replay of delimited text capture logs.
//!
//! Reads the format written by [`crate::sink::csv::CsvSink`]:
//!
//! ```text
//! time;address;RSSI;data;name
//! 1234;AA:BB:CC:DD:EE:FF;-60;020106,03ff9904;Beacon
//! ```
//!
//! Header rows and blank lines are skipped. Replayed observations are stamped
//! with the current monotonic time when read, so registry aging behaves as it
//! would for a live capture.

use crate::mac_address::MacAddress;
use crate::observation::Observation;
use crate::sink::csv::{DELIMITER, HEADER, NOT_AVAILABLE};
use crate::source::{
    CaptureError, CaptureSource, OBSERVATION_CHANNEL_BUFFER_SIZE, ObservationResult, SourceError,
};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const FIELD_COUNT: usize = 5;

/// Where a capture log is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl FromStr for Input {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("empty input path".to_string()),
            "-" => Ok(Input::Stdin),
            path => Ok(Input::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Stdin => write!(f, "-"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Capture source replaying a delimited text log.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    input: Input,
}

impl ReplaySource {
    pub fn new(input: Input) -> Self {
        Self { input }
    }
}

impl CaptureSource for ReplaySource {
    fn start(
        &self,
        verbose: bool,
    ) -> Pin<
        Box<
            dyn Future<Output = Result<mpsc::Receiver<ObservationResult>, SourceError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            info!(input = %self.input, "replaying capture log");
            match &self.input {
                Input::Stdin => Ok(spawn_reader(BufReader::new(tokio::io::stdin()), verbose)),
                Input::File(path) => {
                    let file = tokio::fs::File::open(path)
                        .await
                        .map_err(|source| SourceError::Open {
                            path: path.clone(),
                            source,
                        })?;
                    Ok(spawn_reader(BufReader::new(file), verbose))
                }
            }
        })
    }
}

/// Read capture records from `reader` on a background task.
pub fn spawn_reader<R>(reader: R, verbose: bool) -> mpsc::Receiver<ObservationResult>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OBSERVATION_CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut lines = reader.lines();
        let mut line_number = 0;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    warn!(%error, "capture log read failed");
                    break;
                }
            };
            line_number += 1;

            let result = match parse_record(&line, line_number) {
                Ok(None) => continue,
                Ok(Some(observation)) => Ok(observation),
                Err(error) if verbose => Err(error),
                Err(error) => {
                    warn!(%error, "skipping capture record");
                    continue;
                }
            };
            if tx.send(result).await.is_err() {
                break;
            }
        }
    });

    rx
}

/// Parse one log line.
///
/// Returns `Ok(None)` for header rows and blank lines. The recorded timestamp
/// must be a valid number but is replaced by the current monotonic time.
pub fn parse_record(line: &str, line_number: usize) -> Result<Option<Observation>, CaptureError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line == HEADER {
        return Ok(None);
    }

    let fields: Vec<&str> = line.splitn(FIELD_COUNT, DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(CaptureError::FieldCount {
            line: line_number,
            found: fields.len(),
        });
    }
    let invalid = |field: &'static str, reason: String| CaptureError::InvalidField {
        line: line_number,
        field,
        reason,
    };

    fields[0]
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid("time", e.to_string()))?;
    let address: MacAddress = fields[1]
        .parse()
        .map_err(|e: crate::mac_address::ParseMacError| invalid("address", e.to_string()))?;
    let rssi: i32 = fields[2]
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid("RSSI", e.to_string()))?;
    let raw_payload = match fields[3].trim() {
        NOT_AVAILABLE | "" => Vec::new(),
        data => decode_hex(data).map_err(|reason| invalid("data", reason))?,
    };
    let name = match fields[4] {
        NOT_AVAILABLE | "" => None,
        name => Some(name.to_string()),
    };

    Ok(Some(Observation::now(address, name, rssi, raw_payload)))
}

/// Decode the hex view, ignoring the block separators.
fn decode_hex(data: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = data.bytes().filter(|b| *b != b',').collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in '{data}'"));
    }
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                Ok((hex_value(*hi) << 4) | hex_value(*lo))
            }
            _ => Err(format!("'{data}' is not valid hex")),
        })
        .collect()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
