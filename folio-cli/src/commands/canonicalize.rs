//! Normalise the layout of one part file.

use anyhow::{Context, Result};
use folio_core::canonicalize_part;
use std::fs;
use std::path::Path;

pub fn canonicalize_file(file: &Path, in_place: bool) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Failed to read part {:?}", file))?;
    let slug = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let canonical = canonicalize_part(&slug, &text)
        .with_context(|| format!("Failed to canonicalize {:?}", file))?;

    if in_place {
        if canonical.trim_end() != text.trim_end() {
            fs::write(file, format!("{}\n", canonical))
                .with_context(|| format!("Failed to write part {:?}", file))?;
            tracing::info!("Rewrote {:?}", file);
        }
    } else {
        println!("{}", canonical);
    }
    Ok(())
}
