//! Tracing subscriber initialization.

use keel_config::LogSettings;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Failure initializing the logging subsystem.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level filter did not parse.
    #[error("invalid log level filter: {0}")]
    InvalidLevel(String),
}

/// Installs the global subscriber according to settings.
///
/// JSON output is the production default; human-readable lines are for
/// local development. `RUST_LOG` overrides the configured level.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| LoggingError::InvalidLevel(e.to_string()))?;

    if settings.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
