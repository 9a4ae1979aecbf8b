#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use serde_json::{json, Value};
use shared::capabilities::{HttpError, HttpMethod, HttpRequest};
use shared::{App, Effect, Event, HttpResponse, HttpResult, Model, Settings, ViewModel};

/// An app under test plus its model. Events raised by resolved requests are
/// fed straight back in, the way a shell's core would apply them.
pub struct Session {
    pub app: AppTester<App, Effect>,
    pub model: Model,
}

impl Session {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            app: AppTester::default(),
            model: Model::new(settings),
        }
    }

    pub fn send(&mut self, event: Event) -> Vec<Effect> {
        let update = self.app.update(event, &mut self.model);
        self.apply(update)
    }

    pub fn resolve(&mut self, request: &mut Request<HttpRequest>, result: HttpResult) -> Vec<Effect> {
        let update = self
            .app
            .resolve(request, result)
            .expect("request resolves once");
        self.apply(update)
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    fn apply(&mut self, update: Update<Effect, Event>) -> Vec<Effect> {
        let mut effects = update.effects;
        for event in update.events {
            effects.extend(self.send(event));
        }
        effects
    }
}

pub fn only_http(effects: Vec<Effect>) -> Request<HttpRequest> {
    let mut requests: Vec<_> = effects.into_iter().filter_map(Effect::into_http).collect();
    assert_eq!(requests.len(), 1, "expected exactly one http effect");
    requests.remove(0)
}

pub fn no_http(effects: &[Effect]) -> bool {
    effects.iter().all(Effect::is_render)
}

pub fn body_json(request: &Request<HttpRequest>) -> Value {
    assert_eq!(request.operation.method(), HttpMethod::Post);
    serde_json::from_slice(request.operation.body().expect("a body")).expect("a JSON body")
}

pub fn ok(request: &Request<HttpRequest>, body: Value) -> HttpResult {
    HttpResponse::json_ok(&body, request.operation.request_id())
}

pub fn network_error(request: &Request<HttpRequest>) -> HttpResult {
    Err(HttpError::Connection {
        host: request.operation.url().host().to_string(),
        message: "connection refused".into(),
        request_id: request.operation.request_id().to_string(),
    })
}

pub fn geolocation_body(city: &str, lat: f64, lng: f64) -> Value {
    json!({
        "city": city,
        "region": "Region",
        "country_name": "Country",
        "latitude": lat,
        "longitude": lng,
    })
}

/// Runs the full IP lookup + geolocation chain with successful responses.
pub fn resolve_location(session: &mut Session, city: &str, lat: f64, lng: f64) {
    let mut ip = only_http(session.send(Event::FetchLocationRequested));
    let response = ok(&ip, json!({ "ip": "203.0.113.9" }));
    let mut geo = only_http(session.resolve(&mut ip, response));
    let response = ok(&geo, geolocation_body(city, lat, lng));
    let effects = session.resolve(&mut geo, response);
    assert!(no_http(&effects));
}

/// Dispatches a spam check for `message` and answers it with `is_spam`.
pub fn check_spam(session: &mut Session, message: &str, is_spam: bool) -> Value {
    session.send(Event::MessageChanged(message.to_string()));
    let mut request = only_http(session.send(Event::CheckSpamRequested));
    let sent = body_json(&request);
    let response = ok(&request, json!({ "message": message, "is_spam": is_spam }));
    session.resolve(&mut request, response);
    sent
}
