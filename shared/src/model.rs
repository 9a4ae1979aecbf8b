use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::Settings;

/// Label sent to the classifier when no location has been resolved yet.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Per-action sequence number, assigned when a request is dispatched.
pub type RequestToken = u64;

/// Contact details typed into the form.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    pub phone: String,
}

// Redact debug output because this is user-provided personal data.
impl fmt::Debug for ContactDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactDetails")
            .field("email_present", &!self.email.is_empty())
            .field("phone_present", &!self.phone.is_empty())
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub message: String,
    pub email: String,
    pub phone: String,
}

impl FormState {
    pub fn contact(&self) -> ContactDetails {
        ContactDetails {
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("message_len", &self.message.chars().count())
            .field("email_present", &!self.email.is_empty())
            .field("phone_present", &!self.phone.is_empty())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub city: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
}

impl LocationInfo {
    /// "city, region, country", as shown in the visitor marker's popup.
    pub fn label(&self) -> String {
        format!("{}, {}, {}", self.city, self.region, self.country)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamResult {
    pub message: String,
    pub is_spam: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlaggedLocation {
    pub lat: f64,
    pub lng: f64,
    pub message: String,
}

/// What a spam check was dispatched with. Snapshotted at dispatch so the
/// verdict is paired with the location known when the user asked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpamSubmission {
    pub message: String,
    pub location: Option<LocationInfo>,
}

impl SpamSubmission {
    pub fn location_label(&self) -> &str {
        self.location
            .as_ref()
            .map_or(UNKNOWN_LOCATION, |location| location.city.as_str())
    }

    /// The entry a positive verdict appends, if a location was known.
    pub fn flagged_entry(&self) -> Option<FlaggedLocation> {
        self.location.as_ref().map(|location| FlaggedLocation {
            lat: location.lat,
            lng: location.lng,
            message: self.message.clone(),
        })
    }
}

/// idle -> in-flight -> idle bookkeeping for one kind of request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTracker {
    issued: RequestToken,
    in_flight: u32,
}

impl RequestTracker {
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        self.in_flight += 1;
        self.issued
    }

    pub fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn latest(&self) -> RequestToken {
        self.issued
    }

    pub fn is_stale(&self, token: RequestToken) -> bool {
        token < self.issued
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight > 0
    }
}

/// All session state. Mutated only by `App::update`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Model {
    pub form: FormState,
    pub location: Option<LocationInfo>,
    pub spam_result: Option<SpamResult>,
    pub flagged: Vec<FlaggedLocation>,

    pub settings: Settings,
    pub location_requests: RequestTracker,
    pub spam_requests: RequestTracker,
}

impl Model {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> LocationInfo {
        LocationInfo {
            city: "Paris".into(),
            region: "Ile-de-France".into(),
            country: "France".into(),
            lat: 48.8,
            lng: 2.3,
        }
    }

    #[test]
    fn form_debug_is_redacted() {
        let form = FormState {
            message: "hello".into(),
            email: "someone@example.com".into(),
            phone: "+33 1 23 45 67 89".into(),
        };
        let debug = format!("{form:?}");
        assert!(!debug.contains("someone@example.com"));
        assert!(!debug.contains("+33"));
        assert!(!format!("{:?}", form.contact()).contains("example.com"));
    }

    #[test]
    fn submission_without_location_uses_unknown() {
        let submission = SpamSubmission {
            message: "Free money now".into(),
            location: None,
        };
        assert_eq!(submission.location_label(), UNKNOWN_LOCATION);
        assert!(submission.flagged_entry().is_none());
    }

    #[test]
    fn submission_with_location_uses_city() {
        let submission = SpamSubmission {
            message: "Buy now".into(),
            location: Some(paris()),
        };
        assert_eq!(submission.location_label(), "Paris");
        assert_eq!(
            submission.flagged_entry(),
            Some(FlaggedLocation {
                lat: 48.8,
                lng: 2.3,
                message: "Buy now".into(),
            })
        );
    }

    #[test]
    fn tracker_counts_and_detects_stale_tokens() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert_eq!(tracker.in_flight(), 2);
        assert!(tracker.is_stale(first));
        assert!(!tracker.is_stale(second));

        tracker.settle();
        tracker.settle();
        tracker.settle();
        assert!(!tracker.is_in_flight());
        assert_eq!(tracker.latest(), second);
    }

    #[test]
    fn display_label_joins_place_names() {
        assert_eq!(paris().label(), "Paris, Ile-de-France, France");
    }
}
