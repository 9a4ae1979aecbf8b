//! Layered shell configuration.
//!
//! Priority, lowest first: built-in defaults, the TOML file, then
//! `SPAMWATCH_*` environment variables with `__` between sections
//! (`SPAMWATCH_ENDPOINTS__CLASSIFIER=http://...`).

use std::collections::HashMap;
use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shared::capabilities::DEFAULT_TIMEOUT_MS;
use shared::settings::{DEFAULT_CLASSIFIER_URL, DEFAULT_GEOLOCATION_URL, DEFAULT_IP_ECHO_URL};
use shared::{EndpointUrls, Settings, SettingsError};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "spamwatch.toml";
pub const ENV_PREFIX: &str = "SPAMWATCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_ip_echo")]
    pub ip_echo: String,
    #[serde(default = "default_geolocation")]
    pub geolocation: String,
    #[serde(default = "default_classifier")]
    pub classifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout. A timed out request counts as a failed call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Drop responses that belong to a superseded request.
    #[serde(default)]
    pub discard_stale_responses: bool,
    /// The bundled collaborators listen on loopback, so this defaults on.
    #[serde(default = "default_true")]
    pub allow_private_hosts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_ip_echo() -> String {
    DEFAULT_IP_ECHO_URL.to_string()
}

fn default_geolocation() -> String {
    DEFAULT_GEOLOCATION_URL.to_string()
}

fn default_classifier() -> String {
    DEFAULT_CLASSIFIER_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    concat!("spamwatch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            ip_echo: default_ip_echo(),
            geolocation: default_geolocation(),
            classifier: default_classifier(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discard_stale_responses: false,
            allow_private_hosts: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path` (or `spamwatch.toml` when it exists)
    /// and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Same as [`AppConfig::load`], with the environment replaced by `env`
    /// when given.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => File::new(&path.to_string_lossy(), FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        debug!(
            classifier = %loaded.endpoints.classifier,
            timeout_ms = loaded.http.timeout_ms,
            "configuration loaded"
        );
        Ok(loaded)
    }

    /// Validates the endpoints and limits into core [`Settings`].
    pub fn settings(&self) -> std::result::Result<Settings, SettingsError> {
        let urls = EndpointUrls {
            ip_echo: self.endpoints.ip_echo.clone(),
            geolocation: self.endpoints.geolocation.clone(),
            classifier: self.endpoints.classifier.clone(),
        };

        Settings::new(
            &urls,
            self.http.timeout_ms,
            self.session.discard_stale_responses,
            self.session.allow_private_hosts,
        )
    }
}
