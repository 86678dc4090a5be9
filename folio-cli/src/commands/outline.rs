//! Print a document's outline.

use crate::documents::{load_config, read_document};
use crate::OutlineFormat;
use anyhow::Result;
use folio_core::text::clean_document;
use folio_core::{outline, Settings};
use std::path::Path;

pub fn show_outline(config_path: &Path, dir: &Path, format: OutlineFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let parts = clean_document(&read_document(dir)?).parts;

    let mut settings = Settings::new();
    settings.set("OUTLINE", config.counters.join("."));
    settings.extract(&parts);
    let elements = outline(&parts, &settings.outline_counters());

    match format {
        OutlineFormat::Json => println!("{}", serde_json::to_string_pretty(&elements)?),
        OutlineFormat::Text => {
            for element in &elements {
                let indent = "  ".repeat(element.numbering.depth().saturating_sub(1));
                let status = if parts.contains_key(&element.slug) {
                    String::new()
                } else {
                    " (missing)".to_string()
                };
                println!(
                    "{}{} {} [{}] {} words{}",
                    indent,
                    element.numbering,
                    element.title,
                    element.slug,
                    element.word_count,
                    status
                );
            }
        }
    }
    Ok(())
}
