//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout belongs to the session output.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, ShellError};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Call once, after the configuration is loaded.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal());

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    installed.map_err(|e| ShellError::Logging(e.to_string()))
}

/// Parses a configured level or directive list such as `info` or
/// `spamwatch=debug,shared=trace`.
fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| ShellError::Logging(format!("invalid level '{level}': {e}")))
}
