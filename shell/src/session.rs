//! One-shot flows behind `spamwatch check` and `spamwatch locate`.

use std::io::Write;
use std::path::PathBuf;

use shared::Event;
use tracing::info;

use crate::error::Result;
use crate::render;
use crate::runtime::Runtime;
use crate::transport::Transport;

#[derive(Debug, Clone, Default)]
pub struct ContactArgs {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub message: String,
    pub contact: ContactArgs,
    /// Resolve the location before checking, so spam gets flagged on the map.
    pub locate: bool,
    pub map: Option<PathBuf>,
}

fn fill_contact<T: Transport>(runtime: &mut Runtime<T>, contact: ContactArgs) {
    if let Some(email) = contact.email {
        runtime.dispatch(Event::EmailChanged(email));
    }
    if let Some(phone) = contact.phone {
        runtime.dispatch(Event::PhoneChanged(phone));
    }
}

pub async fn run_locate<T: Transport>(
    runtime: &mut Runtime<T>,
    contact: ContactArgs,
    out: &mut impl Write,
) -> Result<()> {
    fill_contact(runtime, contact);
    runtime.dispatch(Event::FetchLocationRequested);
    runtime.settle().await;

    let view = runtime.view();
    match &view.location {
        Some(location) => writeln!(
            out,
            "{} ({}, {})",
            location.label, location.lat, location.lng
        )?,
        None => writeln!(out, "Location could not be determined")?,
    }
    Ok(())
}

pub async fn run_check<T: Transport>(
    runtime: &mut Runtime<T>,
    args: CheckArgs,
    out: &mut impl Write,
) -> Result<()> {
    runtime.dispatch(Event::MessageChanged(args.message));
    fill_contact(runtime, args.contact);

    if args.locate {
        runtime.dispatch(Event::FetchLocationRequested);
        runtime.settle().await;
    }

    runtime.dispatch(Event::CheckSpamRequested);
    runtime.settle().await;

    let view = runtime.view();
    write!(out, "{}", render::summary(&view))?;
    if view.verdict.is_none() {
        writeln!(out, "No verdict: the spam check did not succeed")?;
    }

    if let Some(path) = args.map {
        render::write_map(&view, &path).await?;
        info!(path = %path.display(), markers = view.map.markers.len(), "map written");
    }
    Ok(())
}
