//! Terminal shell for the spam-watch contact form.
//!
//! Loads configuration, installs logging and runs the core's HTTP effects
//! with `reqwest` on a tokio runtime.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod repl;
pub mod runtime;
pub mod session;
pub mod transport;

pub use error::{Result, ShellError};
pub use runtime::Runtime;
pub use transport::{ReqwestTransport, Transport};
