use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{EndpointUrl, HttpError, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};

pub const DEFAULT_IP_ECHO_URL: &str = "https://api64.ipify.org/?format=json";
pub const DEFAULT_GEOLOCATION_URL: &str = "http://127.0.0.1:5000/get-location";
pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5000/detect";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid {endpoint} endpoint: {source}")]
    InvalidEndpoint {
        endpoint: &'static str,
        #[source]
        source: HttpError,
    },

    #[error("{endpoint} endpoint {url} points at a private host and private hosts are disabled")]
    PrivateEndpoint { endpoint: &'static str, url: String },

    #[error("request timeout must be between 1 and {max} ms, got {got}")]
    InvalidTimeout { got: u64, max: u64 },
}

/// Raw endpoint strings as they come out of configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointUrls {
    pub ip_echo: String,
    pub geolocation: String,
    pub classifier: String,
}

impl Default for EndpointUrls {
    fn default() -> Self {
        Self {
            ip_echo: DEFAULT_IP_ECHO_URL.to_string(),
            geolocation: DEFAULT_GEOLOCATION_URL.to_string(),
            classifier: DEFAULT_CLASSIFIER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub ip_echo: EndpointUrl,
    pub geolocation: EndpointUrl,
    pub classifier: EndpointUrl,
}

impl Endpoints {
    pub fn from_urls(urls: &EndpointUrls, allow_private_hosts: bool) -> Result<Self, SettingsError> {
        Ok(Self {
            ip_echo: Self::endpoint("ip_echo", &urls.ip_echo, allow_private_hosts)?,
            geolocation: Self::endpoint("geolocation", &urls.geolocation, allow_private_hosts)?,
            classifier: Self::endpoint("classifier", &urls.classifier, allow_private_hosts)?,
        })
    }

    fn endpoint(
        name: &'static str,
        raw: &str,
        allow_private_hosts: bool,
    ) -> Result<EndpointUrl, SettingsError> {
        let url = EndpointUrl::parse(raw).map_err(|source| SettingsError::InvalidEndpoint {
            endpoint: name,
            source,
        })?;

        if !allow_private_hosts && url.is_private_host() {
            return Err(SettingsError::PrivateEndpoint {
                endpoint: name,
                url: url.to_string(),
            });
        }

        Ok(url)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ip_echo: EndpointUrl::builtin(DEFAULT_IP_ECHO_URL, "api64.ipify.org"),
            geolocation: EndpointUrl::builtin(DEFAULT_GEOLOCATION_URL, "127.0.0.1"),
            classifier: EndpointUrl::builtin(DEFAULT_CLASSIFIER_URL, "127.0.0.1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub request_timeout_ms: u64,
    /// When set, a response older than the latest request of the same
    /// action is dropped instead of overwriting newer state.
    pub discard_stale_responses: bool,
}

impl Settings {
    pub fn new(
        urls: &EndpointUrls,
        request_timeout_ms: u64,
        discard_stale_responses: bool,
        allow_private_hosts: bool,
    ) -> Result<Self, SettingsError> {
        if request_timeout_ms == 0 || request_timeout_ms > MAX_TIMEOUT_MS {
            return Err(SettingsError::InvalidTimeout {
                got: request_timeout_ms,
                max: MAX_TIMEOUT_MS,
            });
        }

        Ok(Self {
            endpoints: Endpoints::from_urls(urls, allow_private_hosts)?,
            request_timeout_ms,
            discard_stale_responses,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            discard_stale_responses: false,
        }
    }
}
