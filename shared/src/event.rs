use serde::{Deserialize, Serialize};

use crate::capabilities::HttpResult;
use crate::model::{ContactDetails, RequestToken, SpamSubmission};
use crate::settings::Settings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Sent once by the shell, before anything else, with validated settings.
    Configure(Box<Settings>),

    // Form
    MessageChanged(String),
    EmailChanged(String),
    PhoneChanged(String),

    // User actions
    FetchLocationRequested,
    CheckSpamRequested,

    // Collaborator responses (boxed to keep the enum small)
    PublicIpReceived {
        token: RequestToken,
        contact: ContactDetails,
        result: Box<HttpResult>,
    },
    GeolocationReceived {
        token: RequestToken,
        result: Box<HttpResult>,
    },
    SpamVerdictReceived {
        token: RequestToken,
        submission: Box<SpamSubmission>,
        result: Box<HttpResult>,
    },
}
