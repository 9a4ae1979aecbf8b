use tracing::{debug, info, warn};

use crate::capabilities::{Capabilities, HttpError, HttpResult};
use crate::event::Event;
use crate::model::{ContactDetails, LocationInfo, Model, RequestToken, SpamResult, SpamSubmission};
use crate::protocol::{GeolocationRequest, GeolocationResponse, IpEcho, SpamCheckRequest};
use crate::view::ViewModel;

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::Configure(settings) => {
                debug!(
                    timeout_ms = settings.request_timeout_ms,
                    discard_stale = settings.discard_stale_responses,
                    "core configured"
                );
                model.settings = *settings;
            }

            Event::MessageChanged(message) => {
                model.form.message = message;
                caps.render.render();
            }
            Event::EmailChanged(email) => {
                model.form.email = email;
                caps.render.render();
            }
            Event::PhoneChanged(phone) => {
                model.form.phone = phone;
                caps.render.render();
            }

            Event::FetchLocationRequested => Self::request_public_ip(model, caps),
            Event::PublicIpReceived {
                token,
                contact,
                result,
            } => Self::handle_public_ip(token, contact, *result, model, caps),
            Event::GeolocationReceived { token, result } => {
                Self::handle_geolocation(token, *result, model, caps);
            }

            Event::CheckSpamRequested => Self::request_spam_check(model, caps),
            Event::SpamVerdictReceived {
                token,
                submission,
                result,
            } => Self::handle_spam_verdict(token, *submission, *result, model, caps),
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}

impl App {
    fn request_public_ip(model: &mut Model, caps: &Capabilities) {
        let token = model.location_requests.issue();
        let contact = model.form.contact();

        let request = caps
            .http
            .get(&model.settings.endpoints.ip_echo)
            .timeout_ms(model.settings.request_timeout_ms);
        debug!(
            token,
            request_id = request.request_id().unwrap_or("-"),
            "looking up public IP"
        );
        request.send(move |result| Event::PublicIpReceived {
            token,
            contact,
            result: Box::new(result),
        });

        caps.render.render();
    }

    fn handle_public_ip(
        token: RequestToken,
        contact: ContactDetails,
        result: HttpResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if Self::discard_stale_location(token, model) {
            model.location_requests.settle();
            caps.render.render();
            return;
        }

        let echo = match result
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<IpEcho>())
        {
            Ok(echo) => echo,
            Err(e) => {
                Self::log_failure("public IP lookup failed", token, &e);
                model.location_requests.settle();
                caps.render.render();
                return;
            }
        };

        let request = caps
            .http
            .post(&model.settings.endpoints.geolocation)
            .body_json(&GeolocationRequest::new(echo.ip, contact))
            .timeout_ms(model.settings.request_timeout_ms);
        debug!(
            token,
            request_id = request.request_id().unwrap_or("-"),
            "resolving geolocation"
        );
        request.send(move |result| Event::GeolocationReceived {
            token,
            result: Box::new(result),
        });
    }

    fn handle_geolocation(
        token: RequestToken,
        result: HttpResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.location_requests.settle();
        caps.render.render();

        if Self::discard_stale_location(token, model) {
            return;
        }

        match result
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<GeolocationResponse>())
        {
            Ok(response) => {
                let location = LocationInfo::from(response);
                info!(
                    token,
                    city = %location.city,
                    country = %location.country,
                    "location resolved"
                );
                model.location = Some(location);
            }
            Err(e) => Self::log_failure("geolocation lookup failed", token, &e),
        }
    }

    fn request_spam_check(model: &mut Model, caps: &Capabilities) {
        let token = model.spam_requests.issue();
        let submission = SpamSubmission {
            message: model.form.message.clone(),
            location: model.location.clone(),
        };

        let body = SpamCheckRequest {
            message: submission.message.clone(),
            location: submission.location_label().to_string(),
        };

        let request = caps
            .http
            .post(&model.settings.endpoints.classifier)
            .body_json(&body)
            .timeout_ms(model.settings.request_timeout_ms);
        debug!(
            token,
            request_id = request.request_id().unwrap_or("-"),
            location = %body.location,
            "checking message"
        );
        let submission = Box::new(submission);
        request.send(move |result| Event::SpamVerdictReceived {
            token,
            submission,
            result: Box::new(result),
        });

        caps.render.render();
    }

    fn handle_spam_verdict(
        token: RequestToken,
        submission: SpamSubmission,
        result: HttpResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.spam_requests.settle();
        caps.render.render();

        if model.settings.discard_stale_responses && model.spam_requests.is_stale(token) {
            debug!(
                token,
                latest = model.spam_requests.latest(),
                "dropping stale spam verdict"
            );
            return;
        }

        let verdict = match result
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<SpamResult>())
        {
            Ok(verdict) => verdict,
            Err(e) => {
                Self::log_failure("spam check failed", token, &e);
                return;
            }
        };

        info!(token, is_spam = verdict.is_spam, "spam verdict received");

        if verdict.is_spam {
            if let Some(entry) = submission.flagged_entry() {
                model.flagged.push(entry);
            }
        }
        model.spam_result = Some(verdict);
    }

    fn discard_stale_location(token: RequestToken, model: &Model) -> bool {
        let stale = model.settings.discard_stale_responses && model.location_requests.is_stale(token);
        if stale {
            debug!(
                token,
                latest = model.location_requests.latest(),
                "dropping stale location response"
            );
        }
        stale
    }

    fn log_failure(what: &str, token: RequestToken, error: &HttpError) {
        warn!(
            token,
            request_id = error.request_id().unwrap_or("-"),
            status = error.status(),
            error = %error,
            "{what}"
        );
    }
}
