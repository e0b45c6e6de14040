//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Route access events to stdout and everything else to stderr
//! - Configure log level from `RUST_LOG` or the config file
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Two independent streams so the platform collector can tell access
//!   traffic from diagnostics without any file rotation
//! - One write per event, newline terminated, so nothing sits in a buffer

use thiserror::Error;
use tracing_subscriber::{
    filter::{self, Directive},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::ObservabilityConfig;

/// Target used for per-request access events.
pub const ACCESS_TARGET: &str = "slotd::access";

/// Errors from logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] filter::ParseError),

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter for the diagnostic stream: `RUST_LOG` if set, otherwise the
/// configured level, never including access events.
pub fn diagnostics_filter(config: &ObservabilityConfig) -> Result<EnvFilter, LoggingError> {
    let base = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    let no_access: Directive = format!("{}=off", ACCESS_TARGET).parse()?;
    Ok(base.add_directive(no_access))
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let access = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(false)
        .with_filter(filter::filter_fn(|meta| meta.target() == ACCESS_TARGET));

    let diagnostics = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(diagnostics_filter(config)?);

    tracing_subscriber::registry()
        .with(access)
        .with(diagnostics)
        .try_init()?;

    Ok(())
}
