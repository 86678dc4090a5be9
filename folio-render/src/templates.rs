//! Askama template definitions.

use askama::Template;
use folio_core::text::format_count;
use folio_core::Metadata;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Standalone page around a rendered article
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    // Page metadata
    pub title: String,
    pub summary: String,
    pub author: String,
    pub lang: String,
    pub version: String,

    // Content, already HTML
    pub content: String,

    pub word_count: usize,
    pub word_count_label: String,

    /// Optional stylesheet URL.
    pub stylesheet: Option<String>,
}

impl PageTemplate {
    pub fn new(metadata: &Metadata, content: String) -> Self {
        Self {
            title: metadata.title.clone(),
            summary: metadata.summary.clone(),
            author: metadata.author.replace(" + ", ", "),
            lang: "en".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            content,
            word_count: metadata.word_count,
            word_count_label: format!("{} words", format_count(metadata.word_count)),
            stylesheet: None,
        }
    }

    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheet = Some(href.into());
        self
    }
}

/// Wrap `article_html` in a full page.
pub fn render_page(metadata: &Metadata, article_html: &str) -> Result<String, RenderError> {
    Ok(PageTemplate::new(metadata, article_html.to_string()).render()?)
}
