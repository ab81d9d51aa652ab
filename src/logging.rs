//! Logging setup for the binary
//!
//! The library only emits `tracing` events; installing a subscriber is
//! left to the caller.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when neither `--log-level` nor `RUST_LOG` is given.
/// Completions go to stdout, so stay quiet unless asked.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Initialize the stderr logger
///
/// # Arguments
/// * `no_color` - Disable ANSI colors
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "warn")
pub fn init_logger(no_color: bool, log_level: Option<&str>) -> Result<(), TryInitError> {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_layer).try_init()
}
