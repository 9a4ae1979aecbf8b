use serde::{Deserialize, Serialize};

use crate::map::MapView;
use crate::model::{LocationInfo, Model, SpamResult};

pub const SPAM_BANNER: &str = "Spam detected!";
pub const SAFE_BANNER: &str = "Message is safe.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Success,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&LocationInfo> for LocationView {
    fn from(location: &LocationInfo) -> Self {
        Self {
            label: location.label(),
            lat: location.lat,
            lng: location.lng,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictView {
    pub banner: String,
    pub severity: Severity,
    pub message: String,
    pub spam: String,
}

impl From<&SpamResult> for VerdictView {
    fn from(result: &SpamResult) -> Self {
        let (banner, severity, spam) = if result.is_spam {
            (SPAM_BANNER, Severity::Error, "Yes")
        } else {
            (SAFE_BANNER, Severity::Success, "No")
        };

        Self {
            banner: banner.to_string(),
            severity,
            message: result.message.clone(),
            spam: spam.to_string(),
        }
    }
}

/// Everything a shell needs to draw the form, the verdict and the map.
/// Contact fields are echoed so the shell can show what will be sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub message: String,
    pub email: String,
    pub phone: String,
    pub location: Option<LocationView>,
    pub verdict: Option<VerdictView>,
    pub map: MapView,
    pub locating: bool,
    pub checking: bool,
}

impl ViewModel {
    pub fn from_model(model: &Model) -> Self {
        Self {
            message: model.form.message.clone(),
            email: model.form.email.clone(),
            phone: model.form.phone.clone(),
            location: model.location.as_ref().map(LocationView::from),
            verdict: model.spam_result.as_ref().map(VerdictView::from),
            map: MapView::from_model(model),
            locating: model.location_requests.is_in_flight(),
            checking: model.spam_requests.is_in_flight(),
        }
    }
}
