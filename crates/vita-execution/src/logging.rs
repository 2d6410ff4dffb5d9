//! Tracing setup for the terminal binary.
//!
//! Logs go to stderr so stdout only ever carries the conversation.

use tracing_subscriber::EnvFilter;
use vita_core::{Result, VitaError};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the global fmt subscriber.
///
/// # Errors
///
/// Returns `VitaError::Configuration` if a global subscriber is already set.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| VitaError::configuration(format!("failed to initialise logging: {err}")))
}
