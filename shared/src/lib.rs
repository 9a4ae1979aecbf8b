//! Core of the spam-watch contact form.
//!
//! The core owns the session [`Model`], turns [`Event`]s into state changes
//! and asks the shell for side effects through [`Effect`]s. It performs no
//! I/O itself, so every handler can be driven with canned responses.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod map;
pub mod model;
pub mod protocol;
pub mod settings;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect, HttpError, HttpRequest, HttpResponse, HttpResult};
pub use event::Event;
pub use map::{MapMarker, MapView, MarkerKind};
pub use model::{FlaggedLocation, FormState, LocationInfo, Model, SpamResult};
pub use settings::{EndpointUrls, Settings, SettingsError};
pub use view::ViewModel;

/// The app bound to its session state. Shells hold one per session, push
/// events in and execute the effects that come out.
pub type Core = crux_core::Core<Effect, App>;
