use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;
pub const MAX_RESPONSE_BODY_SIZE: usize = 4 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const MAX_URL_LENGTH: usize = 2048;
const ERROR_SNIPPET_CHARS: usize = 200;

/// An absolute http(s) URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointUrl {
    url: String,
    host: String,
}

impl EndpointUrl {
    pub fn parse(raw: &str) -> Result<Self, HttpError> {
        let invalid = |reason: &str| HttpError::InvalidUrl {
            url: raw.chars().take(100).collect(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("empty URL"));
        }
        if raw.len() > MAX_URL_LENGTH {
            return Err(invalid("URL too long"));
        }

        let parsed = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("credentials in URL"));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_ascii_lowercase();

        Ok(Self {
            url: parsed.into(),
            host,
        })
    }

    /// For compiled-in defaults that are already in normalized form.
    pub(crate) fn builtin(url: &'static str, host: &'static str) -> Self {
        Self {
            url: url.to_string(),
            host: host.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Loopback, link-local, RFC 1918 and unique-local hosts, plus the usual
    /// local-only names.
    pub fn is_private_host(&self) -> bool {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');

        if host == "localhost"
            || [".localhost", ".local", ".internal"]
                .iter()
                .any(|suffix| host.ends_with(suffix))
        {
            return true;
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => {
                ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
            }
            Ok(IpAddr::V6(ip)) => {
                let first = ip.segments()[0];
                ip.is_loopback()
                    || ip.is_unspecified()
                    || (first & 0xfe00) == 0xfc00
                    || (first & 0xffc0) == 0xfe80
            }
            Err(_) => false,
        }
    }
}

impl std::fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Header list with case-insensitive names. Setting a name replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaders(Vec<(String, String)>);

impl HttpHeaders {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for HttpHeaders {
    fn from(headers: Vec<(String, String)>) -> Self {
        Self(headers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A request the shell should perform. Each one gets a fresh request id,
/// sent as `X-Request-Id` and echoed in every log line about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    url: EndpointUrl,
    headers: HttpHeaders,
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
    max_response_size: usize,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: EndpointUrl) -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut headers = HttpHeaders::default();
        headers.set(REQUEST_ID_HEADER, request_id.clone());

        Self {
            method,
            url,
            headers,
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_id,
            max_response_size: MAX_RESPONSE_BODY_SIZE,
        }
    }

    pub fn get(url: EndpointUrl) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: EndpointUrl) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, HttpError> {
        if self.method == HttpMethod::Get {
            return Err(HttpError::InvalidRequest {
                reason: "GET requests carry no body".to_string(),
            });
        }

        let body = serde_json::to_vec(value).map_err(|e| HttpError::InvalidRequest {
            reason: format!("body not serializable: {e}"),
        })?;
        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(HttpError::BodyTooLarge {
                size: body.len(),
                max: MAX_REQUEST_BODY_SIZE,
            });
        }

        self.headers.set("Content-Type", "application/json");
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, HttpError> {
        if !(1..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
            return Err(HttpError::InvalidRequest {
                reason: format!("timeout must be 1..={MAX_TIMEOUT_MS}ms, got {timeout_ms}"),
            });
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &EndpointUrl {
        &self.url
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn max_response_size(&self) -> usize {
        self.max_response_size
    }
}

impl Operation for HttpRequest {
    type Output = HttpResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("request body is {size} bytes, limit is {max}")]
    BodyTooLarge { size: usize, max: usize },

    #[error("response body is over {max} bytes ({size} seen)")]
    ResponseTooLarge {
        size: usize,
        max: usize,
        request_id: String,
    },

    #[error("could not reach {host}: {message}")]
    Connection {
        host: String,
        message: String,
        request_id: String,
    },

    #[error("no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64, request_id: String },

    #[error("status {status}: {body}")]
    Status {
        status: u16,
        body: String,
        request_id: String,
    },

    #[error("unreadable response: {reason}")]
    InvalidResponse { reason: String, request_id: String },
}

impl HttpError {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            HttpError::ResponseTooLarge { request_id, .. }
            | HttpError::Connection { request_id, .. }
            | HttpError::Timeout { request_id, .. }
            | HttpError::Status { request_id, .. }
            | HttpError::InvalidResponse { request_id, .. } => Some(request_id),
            HttpError::InvalidUrl { .. }
            | HttpError::InvalidRequest { .. }
            | HttpError::BodyTooLarge { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: HttpHeaders,
    body: Vec<u8>,
    request_id: String,
    duration_ms: u64,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        headers: HttpHeaders,
        body: Vec<u8>,
        request_id: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request_id: request_id.into(),
            duration_ms,
        }
    }

    /// 200 with a JSON body, mostly for shells and tests.
    pub fn json_ok<T: Serialize>(
        value: &T,
        request_id: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let request_id = request_id.into();
        let body = serde_json::to_vec(value).map_err(|e| HttpError::InvalidResponse {
            reason: format!("body not serializable: {e}"),
            request_id: request_id.clone(),
        })?;
        let headers = HttpHeaders::from(vec![(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        Ok(Self::new(200, headers, body, request_id, 0))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Any non-2xx status is a failed call.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.is_success() {
            return Ok(self);
        }

        Err(HttpError::Status {
            status: self.status,
            body: String::from_utf8_lossy(&self.body)
                .chars()
                .take(ERROR_SNIPPET_CHARS)
                .collect(),
            request_id: self.request_id,
        })
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::InvalidResponse {
            reason: e.to_string(),
            request_id: self.request_id.clone(),
        })
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;
