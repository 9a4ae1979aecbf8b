//! Executes the core's HTTP effects.

use std::time::Instant;

use async_trait::async_trait;
use shared::capabilities::{HttpHeaders, HttpMethod, HttpRequest};
use shared::{HttpError, HttpResponse, HttpResult};
use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::error::Result;

/// Something that can perform an [`HttpRequest`].
///
/// Any status code is a successful transport result; the core decides
/// what a non-2xx response means.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: &HttpRequest) -> HttpResult;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client })
    }

    fn map_error(error: reqwest::Error, request: &HttpRequest) -> HttpError {
        let request_id = request.request_id().to_string();

        if error.is_timeout() {
            HttpError::Timeout {
                timeout_ms: request.timeout_ms(),
                request_id,
            }
        } else if error.is_body() || error.is_decode() {
            HttpError::InvalidResponse {
                reason: error.to_string(),
                request_id,
            }
        } else {
            HttpError::Connection {
                host: request.url().host().to_string(),
                message: error.to_string(),
                request_id,
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> HttpResult {
        let started = Instant::now();
        let request_id = request.request_id().to_string();
        let max = request.max_response_size();

        let method = match request.method() {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, request.url().as_str())
            .timeout(request.timeout());
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        trace!(request_id = %request_id, url = %request.url(), "sending request");
        let mut response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(e, request))?;

        let status = response.status().as_u16();
        if let Some(length) = response.content_length() {
            let size = usize::try_from(length).unwrap_or(usize::MAX);
            if size > max {
                return Err(HttpError::ResponseTooLarge {
                    size,
                    max,
                    request_id,
                });
            }
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::map_error(e, request))?
        {
            if body.len() + chunk.len() > max {
                return Err(HttpError::ResponseTooLarge {
                    size: body.len() + chunk.len(),
                    max,
                    request_id,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(request_id = %request_id, status, duration_ms, "response received");

        Ok(HttpResponse::new(
            status,
            HttpHeaders::from(headers),
            body,
            request_id,
            duration_ms,
        ))
    }
}
