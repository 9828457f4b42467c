//! Subscriber setup
//!
//! Library code only emits `tracing` events; binaries and tests call
//! [`init`] once to see them.

use crate::error::StateError;
use crate::options::LogConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides [`LogConfig::level`]
pub const LOG_ENV: &str = "FIBER_LOG";

/// Install a global `fmt` subscriber
///
/// # Errors
/// Returns error if the filter directive is invalid or a global subscriber
/// is already installed
pub fn init(config: &LogConfig) -> Result<(), StateError> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive),
        Err(_) => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| StateError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StateError::Logging(e.to_string()))?;

    tracing::debug!("Logging initialized at {}", config.level);
    Ok(())
}
