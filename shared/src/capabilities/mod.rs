//! Effects the core asks the shell to perform.
//!
//! `update` never does I/O. Handlers call the capabilities below, the shell
//! receives the resulting [`Effect`]s from [`crux_core::Core`], performs the
//! work and resolves each request with its outcome.

mod http;

use crux_core::bridge::ResolveSerialized;
use crux_core::capability::{Capability, CapabilityContext, ProtoContext};
use crux_core::render::RenderOperation;
use crux_core::{Request, WithContext};
use serde::{Deserialize, Serialize};

pub use crux_core::render::Render;

pub use self::http::{
    EndpointUrl, HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult,
    DEFAULT_TIMEOUT_MS, MAX_REQUEST_BODY_SIZE, MAX_RESPONSE_BODY_SIZE, MAX_TIMEOUT_MS,
    REQUEST_ID_HEADER,
};

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppRender = Render<Event>;

pub struct Capabilities {
    pub http: AppHttp,
    pub render: AppRender,
}

#[derive(Debug)]
pub enum Effect {
    Http(Request<HttpRequest>),
    Render(Request<RenderOperation>),
}

/// Serializable mirror of [`Effect`] for shells across an FFI boundary.
#[derive(Serialize, Deserialize)]
#[serde(rename = "Effect")]
pub enum EffectFfi {
    Http(HttpRequest),
    Render(RenderOperation),
}

impl crux_core::Effect for Effect {
    type Ffi = EffectFfi;

    fn serialize(self) -> (Self::Ffi, ResolveSerialized) {
        match self {
            Effect::Http(request) => request.serialize(EffectFfi::Http),
            Effect::Render(request) => request.serialize(EffectFfi::Render),
        }
    }
}

impl Effect {
    pub fn is_http(&self) -> bool {
        matches!(self, Effect::Http(_))
    }

    pub fn is_render(&self) -> bool {
        matches!(self, Effect::Render(_))
    }

    pub fn into_http(self) -> Option<Request<HttpRequest>> {
        match self {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        }
    }
}

impl WithContext<App, Effect> for Capabilities {
    fn new_with_context(context: ProtoContext<Effect, Event>) -> Capabilities {
        Capabilities {
            http: Http::new(context.specialize(Effect::Http)),
            render: Render::new(context.specialize(Effect::Render)),
        }
    }
}

/// Outbound HTTP. Each call becomes one [`Effect::Http`] and its outcome
/// comes back as the event built by the callback.
pub struct Http<Ev> {
    context: CapabilityContext<HttpRequest, Ev>,
}

impl<Ev> Clone for Http<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Http<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<HttpRequest, Ev>) -> Self {
        Self { context }
    }

    pub fn get(&self, url: &EndpointUrl) -> RequestBuilder<Ev> {
        RequestBuilder::new(self.context.clone(), HttpRequest::get(url.clone()))
    }

    pub fn post(&self, url: &EndpointUrl) -> RequestBuilder<Ev> {
        RequestBuilder::new(self.context.clone(), HttpRequest::post(url.clone()))
    }

    pub fn send<F>(&self, request: HttpRequest, callback: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        RequestBuilder::new(self.context.clone(), request).send(callback);
    }
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpRequest;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Http::new(self.context.map_event(f))
    }
}

/// A request under construction.
///
/// Builder errors are carried along and handed to the callback on
/// [`send`](RequestBuilder::send), so a request that cannot be built fails
/// the same way as one the shell could not complete.
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder<Ev> {
    context: CapabilityContext<HttpRequest, Ev>,
    request: Result<HttpRequest, HttpError>,
}

impl<Ev> RequestBuilder<Ev>
where
    Ev: 'static,
{
    fn new(context: CapabilityContext<HttpRequest, Ev>, request: HttpRequest) -> Self {
        Self {
            context,
            request: Ok(request),
        }
    }

    pub fn body_json<T: Serialize>(mut self, value: &T) -> Self {
        self.request = self.request.and_then(|request| request.with_json(value));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request = self
            .request
            .and_then(|request| request.with_timeout_ms(timeout_ms));
        self
    }

    /// Id of the request, or `None` when building it failed.
    pub fn request_id(&self) -> Option<&str> {
        self.request.as_ref().ok().map(HttpRequest::request_id)
    }

    pub fn send<F>(self, callback: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        let request = self.request;
        self.context.spawn(async move {
            let result = match request {
                Ok(request) => ctx.request_from_shell(request).await,
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crux_core::testing::AppTester;

    #[test]
    fn sending_produces_one_http_effect_and_resolves_to_the_callback_event() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        let url = EndpointUrl::parse("https://api64.ipify.org?format=json").unwrap();

        app.as_ref()
            .http
            .get(&url)
            .send(|result| Event::GeolocationReceived {
                token: 7,
                result: Box::new(result),
            });

        let update = app.update(Event::MessageChanged("hi".into()), &mut model);
        let mut requests: Vec<_> = update.into_effects().filter_map(Effect::into_http).collect();
        assert_eq!(requests.len(), 1);

        let request = &mut requests[0];
        let request_id = request.operation.request_id().to_string();
        let update = app
            .resolve(
                request,
                Err(HttpError::Timeout {
                    timeout_ms: 10,
                    request_id: request_id.clone(),
                }),
            )
            .unwrap();

        match update.events.as_slice() {
            [Event::GeolocationReceived { token: 7, result }] => {
                let err = result.as_ref().as_ref().unwrap_err();
                assert_eq!(err.request_id(), Some(request_id.as_str()));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn build_errors_skip_the_shell() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        let url = EndpointUrl::parse("https://api64.ipify.org?format=json").unwrap();

        app.as_ref()
            .http
            .get(&url)
            .timeout_ms(0)
            .send(|result| Event::GeolocationReceived {
                token: 1,
                result: Box::new(result),
            });

        let update = app.update(Event::PhoneChanged(String::new()), &mut model);
        assert!(!update.effects().any(Effect::is_http));
        assert!(matches!(
            update.events.as_slice(),
            [Event::GeolocationReceived { result, .. }]
                if matches!(result.as_ref(), Err(HttpError::InvalidRequest { .. }))
        ));
    }
}
