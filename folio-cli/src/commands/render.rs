//! Render a document directory to HTML.

use crate::documents::{load_config, read_document, write_output};
use anyhow::{Context, Result};
use folio_core::{RenderOptions, Wiki};
use folio_render::render_page;
use std::path::Path;

pub struct RenderArgs {
    pub fragment: bool,
    pub preview: bool,
    pub standalone: bool,
}

pub fn render_document(
    config_path: &Path,
    dir: &Path,
    args: RenderArgs,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let parts = read_document(dir)?;

    let mut wiki = Wiki::new(config);
    let options = RenderOptions {
        fragment: args.fragment,
        preview: args.preview,
    };
    let article = wiki
        .process(&parts, options)
        .with_context(|| format!("Failed to render {:?}", dir))?;

    for diagnostic in wiki.outline().diagnostics() {
        tracing::warn!(
            "[{}] {}: {}",
            diagnostic.part_slug.as_deref().unwrap_or("-"),
            diagnostic.code,
            diagnostic.message
        );
    }

    let html = if args.standalone {
        let doc_slug = dir.file_name().map(|name| name.to_string_lossy().to_string());
        let metadata = wiki.compile_metadata(doc_slug.as_deref());
        render_page(&metadata, &article).context("Failed to render page template")?
    } else {
        article
    };
    write_output(output, &html)
}
