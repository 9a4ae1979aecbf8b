//! Plain-text rendering of the [`ViewModel`].

use std::fmt::Write as _;
use std::path::Path;

use shared::ViewModel;

use crate::error::Result;

/// The status block printed after every render.
pub fn summary(view: &ViewModel) -> String {
    let mut out = String::new();

    match &view.location {
        Some(location) => {
            let _ = writeln!(
                out,
                "Location: {} ({}, {})",
                location.label, location.lat, location.lng
            );
        }
        None if view.locating => out.push_str("Location: locating...\n"),
        None => out.push_str("Location: unknown\n"),
    }

    match &view.verdict {
        Some(verdict) => {
            let _ = writeln!(out, "{}", verdict.banner);
            let _ = writeln!(out, "  Message: {}", verdict.message);
            let _ = writeln!(out, "  Spam: {}", verdict.spam);
        }
        None if view.checking => out.push_str("Checking message...\n"),
        None => {}
    }

    let _ = writeln!(out, "Flagged locations: {}", view.map.flagged_count());
    out
}

/// The form fields as they would be sent. Contact details are shown in full,
/// since the user typed them.
pub fn form(view: &ViewModel) -> String {
    format!(
        "Message: {}\nEmail: {}\nPhone: {}\n",
        view.message, view.email, view.phone
    )
}

pub fn map_geojson(view: &ViewModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(&view.map.to_geojson())?)
}

pub async fn write_map(view: &ViewModel, path: &Path) -> Result<()> {
    let geojson = map_geojson(view)?;
    tokio::fs::write(path, geojson).await?;
    Ok(())
}
