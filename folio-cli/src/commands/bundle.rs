//! Bundle a document into one text file, and back.

use crate::documents::{load_config, read_document, write_document, write_output};
use anyhow::{Context, Result};
use folio_core::text::clean_document;
use folio_core::{export_text, import_text};
use std::fs;
use std::path::Path;

pub fn export_document(config_path: &Path, dir: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let parts = clean_document(&read_document(dir)?).parts;
    write_output(output, &export_text(&parts, &config.counters))
}

pub fn import_document(bundle: &Path, dir: &Path) -> Result<()> {
    let text =
        fs::read_to_string(bundle).with_context(|| format!("Failed to read bundle {:?}", bundle))?;
    let parts = import_text(&text).with_context(|| format!("Failed to import {:?}", bundle))?;
    write_document(dir, &parts)?;
    tracing::info!("Imported {} parts into {:?}", parts.len(), dir);
    Ok(())
}
