//! Print document metadata as JSON.

use crate::documents::{load_config, read_document};
use anyhow::{Context, Result};
use folio_core::{RenderOptions, Wiki};
use std::path::Path;

/// Metadata comes from a full render, so settings and word counts match
/// what readers see.
pub fn show_metadata(
    config_path: &Path,
    dir: &Path,
    user: &str,
    timezone: Option<String>,
    doc: Option<&str>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.user = user.to_string();
    if let Some(timezone) = timezone {
        config.timezone = timezone;
    }
    let parts = read_document(dir)?;

    let mut wiki = Wiki::new(config);
    wiki.process(&parts, RenderOptions::default())
        .with_context(|| format!("Failed to render {:?}", dir))?;
    let metadata = wiki.compile_metadata(doc);

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
