//! Core application runner for `beacon-logger`.
//!
//! Kept apart from CLI parsing and process exit codes so the run loop can be
//! driven by a fake capture source and in-memory output streams.

use crate::decoder::Decoder;
use crate::mac_address::MacAddress;
use crate::pipeline::Pipeline;
use crate::profile::{self, Profile};
use crate::registry::DeviceRegistry;
use crate::sink::csv::CsvSink;
use crate::source::{CaptureSource, Input, SourceError};
use crate::view::{ObservationFormatter, ViewKind, render_table};
use clap::Parser;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Capture log to replay; "-" reads standard input.
    #[arg(long, default_value = "-")]
    pub input: Input,

    /// Write every accepted observation to this delimited text log.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Forget devices not seen for this many seconds (0 keeps them forever).
    #[arg(long, default_value_t = 50, value_name = "SECS")]
    pub max_age: u64,

    /// Only accept observations from this address (repeatable).
    #[arg(long = "filter", value_name = "MAC")]
    pub filter: Vec<MacAddress>,

    /// Label an identity card.
    /// Format: --profile 18:04:ED:61:66:3D=Reception
    #[arg(long = "profile", value_parser = crate::profile::parse_profile, value_name = "PROFILE")]
    pub profiles: Vec<Profile>,

    /// How each observation is printed
    #[arg(long, default_value_t, value_enum)]
    pub view: ViewKind,

    /// Print the device registry at this interval.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::duration::parse_interval)]
    pub refresh: Option<Duration>,

    /// Print the device registry once the input is exhausted
    #[arg(long)]
    pub summary: bool,

    /// Verbose output, print rejected capture records
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input: Input::Stdin,
            log_file: None,
            max_age: crate::registry::DEFAULT_MAX_AGE.as_secs(),
            filter: Vec::new(),
            profiles: Vec::new(),
            view: ViewKind::default(),
            refresh: None,
            summary: false,
            verbose: false,
        }
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn build_pipeline(options: &Options) -> Pipeline {
    let registry = Arc::new(DeviceRegistry::new(Duration::from_secs(options.max_age)));
    let decoder = Decoder::new(profile::to_map(&options.profiles));
    let mut pipeline =
        Pipeline::new(registry, decoder).with_filter(options.filter.iter().copied());

    if let Some(path) = &options.log_file {
        match CsvSink::create(path) {
            Ok(sink) => {
                pipeline.attach_sink(Box::new(sink));
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "cannot open log file, continuing without it")
            }
        }
    }
    pipeline
}

fn refresh_timer(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Completes on the next refresh tick; never completes without a timer.
async fn next_refresh(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn write_registry(
    pipeline: &Pipeline,
    formatter: &dyn ObservationFormatter,
    out: &mut dyn Write,
) -> io::Result<()> {
    let snapshot = pipeline.snapshot();
    writeln!(out, "-- {} device(s) --", snapshot.len())?;
    out.write_all(render_table(formatter, &snapshot).as_bytes())
}

/// Run the core processing loop, writing views to `out` and verbose errors to `err`.
///
/// - Accepted observations are decoded, logged to the sink, recorded in the registry
///   and written to `out` in the configured view.
/// - Capture errors are written to `err` only when `options.verbose` is true.
/// - With `refresh`, the registry is printed periodically; with `summary`, once at the end.
pub async fn run_with_io(
    options: Options,
    source: &dyn CaptureSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let mut pipeline = build_pipeline(&options);
    pipeline.start_session();
    let formatter = options.view.formatter();
    let mut refresh = options.refresh.map(refresh_timer);

    let mut observations = source.start(options.verbose).await?;
    let mut accepted = 0usize;

    loop {
        tokio::select! {
            received = observations.recv() => {
                let Some(result) = received else { break };
                match result {
                    Ok(observation) => {
                        if let Some(processed) = pipeline.process(observation) {
                            accepted += 1;
                            writeln!(out, "{}", formatter.format(&processed))?;
                        }
                    }
                    Err(capture_err) => {
                        if options.verbose {
                            writeln!(err, "{capture_err}")?;
                        }
                    }
                }
            }
            _ = next_refresh(&mut refresh) => {
                write_registry(&pipeline, formatter.as_ref(), out)?;
            }
        }
    }

    if options.summary {
        write_registry(&pipeline, formatter.as_ref(), out)?;
    }
    out.flush()?;

    info!(
        accepted,
        devices = pipeline.registry().len(),
        "capture source exhausted"
    );
    Ok(())
}
