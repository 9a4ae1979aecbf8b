use std::io;

use shared::SettingsError;
use thiserror::Error;

/// Failures of the shell itself. Collaborator failures never end up here:
/// the core logs and swallows them.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
