//! Logging setup for the CLI, built on `tracing`.
//!
//! Diagnostics go to stderr so they never mix with the report on stdout.
//!
//! - `RUST_LOG`: filter directives, used when `--log-level` is not given
//! - `SOSFETCH_LOG_FORMAT`: `pretty` (default) or `json`

use std::io;

use clap::ValueEnum;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per event
    Json,
}

/// Build the filter: explicit level, then `RUST_LOG`, then `info`.
pub fn build_filter(explicit: Option<&str>) -> Result<EnvFilter, String> {
    match explicit {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| format!("Invalid log level '{directives}': {e}")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber.
pub fn init_logging(level: Option<&str>, format: LogFormat) -> Result<(), String> {
    let filter = build_filter(level)?;

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {e}"))
}
