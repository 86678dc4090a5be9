//! Reading and writing document directories.
//!
//! A document on disk is a directory of `<slug>.txt` files; images beside
//! them are passed through by name.

use anyhow::{Context, Result};
use folio_core::{EngineConfig, Parts};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Load `folio.yml` when it exists, defaults otherwise.
pub fn load_config(config_path: &Path) -> Result<EngineConfig> {
    if !config_path.exists() {
        tracing::debug!("No config at {:?}, using defaults", config_path);
        return Ok(EngineConfig::default());
    }
    let config = EngineConfig::from_file(config_path)
        .with_context(|| format!("Failed to load configuration {:?}", config_path))?;
    tracing::debug!("Loaded config from {:?}", config.config_path());
    Ok(config)
}

/// Parts keyed by file name, e.g. `index.txt`; the engine drops the suffix.
pub fn read_document(dir: &Path) -> Result<Parts> {
    if !dir.is_dir() {
        anyhow::bail!("Not a document directory: {:?}", dir);
    }
    let mut parts = Parts::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory {:?}", dir))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        match entry.path().extension().and_then(|e| e.to_str()) {
            Some("txt") => {
                let text = fs::read_to_string(entry.path())
                    .with_context(|| format!("Failed to read part {:?}", entry.path()))?;
                parts.insert(name, text);
            }
            Some("png") | Some("jpg") => {
                parts.insert(name, String::new());
            }
            _ => {}
        }
    }
    tracing::debug!("Read {} parts from {:?}", parts.len(), dir);
    Ok(parts)
}

/// Write each part to `<slug>.txt`.
pub fn write_document(dir: &Path, parts: &Parts) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {:?}", dir))?;
    for (slug, text) in parts {
        let path = dir.join(format!("{}.txt", slug));
        fs::write(&path, format!("{}\n", text.trim_end()))
            .with_context(|| format!("Failed to write part {:?}", path))?;
    }
    Ok(())
}

/// Write to a file, or to stdout when there is none.
pub fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write output {:?}", path))
        }
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}
