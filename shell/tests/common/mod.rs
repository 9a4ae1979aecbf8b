#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shared::capabilities::HttpRequest;
use shared::settings::{DEFAULT_CLASSIFIER_URL, DEFAULT_GEOLOCATION_URL, DEFAULT_IP_ECHO_URL};
use shared::{HttpError, HttpResponse, HttpResult, Settings};
use spamwatch::{Runtime, Transport};

pub const IP_ECHO: &str = DEFAULT_IP_ECHO_URL;
pub const GEOLOCATION: &str = DEFAULT_GEOLOCATION_URL;
pub const CLASSIFIER: &str = DEFAULT_CLASSIFIER_URL;

pub enum Reply {
    Json(Value),
    Status(u16),
    Unreachable,
    /// The transport itself blows up mid-request.
    Crash,
}

struct Scripted {
    delay: Duration,
    reply: Reply,
}

/// Answers each URL from its own queue, in request order.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, reply: Reply) -> Self {
        self.reply_after(url, Duration::ZERO, reply)
    }

    pub fn reply_after(self, url: &str, delay: Duration, reply: Reply) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Scripted { delay, reply });
        self
    }

    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &HttpRequest) -> HttpResult {
        self.seen.lock().unwrap().push(request.clone());
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(request.url().as_str())
            .and_then(VecDeque::pop_front);

        let Some(Scripted { delay, reply }) = scripted else {
            return Err(HttpError::Connection {
                host: request.url().host().to_string(),
                message: "no scripted reply".into(),
                request_id: request.request_id().to_string(),
            });
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Json(body) => HttpResponse::json_ok(&body, request.request_id()),
            Reply::Status(status) => Ok(HttpResponse::new(
                status,
                Default::default(),
                Vec::new(),
                request.request_id(),
                0,
            )),
            Reply::Unreachable => Err(HttpError::Connection {
                host: request.url().host().to_string(),
                message: "connection refused".into(),
                request_id: request.request_id().to_string(),
            }),
            Reply::Crash => panic!("transport crashed on {}", request.url()),
        }
    }
}

pub fn runtime(transport: FakeTransport) -> Runtime<FakeTransport> {
    Runtime::new(Settings::default(), transport)
}

pub fn guarded_runtime(transport: FakeTransport) -> Runtime<FakeTransport> {
    let settings = Settings {
        discard_stale_responses: true,
        ..Settings::default()
    };
    Runtime::new(settings, transport)
}

pub fn geolocation(city: &str, lat: f64, lng: f64) -> Reply {
    Reply::Json(serde_json::json!({
        "city": city,
        "region": "Region",
        "country_name": "Country",
        "latitude": lat,
        "longitude": lng,
    }))
}

pub fn verdict(message: &str, is_spam: bool) -> Reply {
    Reply::Json(serde_json::json!({ "message": message, "is_spam": is_spam }))
}

pub fn ip(address: &str) -> Reply {
    Reply::Json(serde_json::json!({ "ip": address }))
}
