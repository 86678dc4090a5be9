//! Shared types for folio
//!
//! This crate provides the plain data types passed between the wiki engine,
//! the renderer and the command line: outline elements, section numbering,
//! document metadata and content diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A document: part slug to part text.
pub type Parts = BTreeMap<String, String>;

/// Slug of the part holding title, settings and the outline.
pub const INDEX_SLUG: &str = "index";

/// Slug of the part holding bibliography lines.
pub const BIBLIO_SLUG: &str = "biblio";

/// Section numbering, one token per outline level (e.g. `["1", "a", "iii"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Numbering(pub Vec<String>);

impl Numbering {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// The numbering given to the index part.
    pub fn index() -> Self {
        Self(vec!["0".to_string()])
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// Dotted form, `1.a.iii`.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// All proper ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Numbering> {
        let mut out = Vec::new();
        let mut tokens = self.0.clone();
        while tokens.len() > 1 {
            tokens.pop();
            out.push(Numbering(tokens.clone()));
        }
        out
    }
}

impl fmt::Display for Numbering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl From<Vec<&str>> for Numbering {
    fn from(tokens: Vec<&str>) -> Self {
        Self(tokens.into_iter().map(String::from).collect())
    }
}

/// One entry of a document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineElement {
    pub numbering: Numbering,
    /// Part slug this element renders.
    pub slug: String,
    pub title: String,
    pub title_slug: String,
    pub word_count: usize,
}

impl OutlineElement {
    /// Anchor id for this section heading: `<dotted-numbering>_<slug>`.
    pub fn anchor(&self) -> String {
        format!("{}_{}", self.numbering.dotted(), self.slug)
    }
}

/// Derived document fields kept by the store alongside the parts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub user: String,
    pub slug: String,
    pub summary: String,
    pub author: String,
    #[serde(default)]
    pub email: String,
    pub license: String,
    pub publish: String,
    #[serde(default)]
    pub todo: String,
    /// Localized display date.
    pub date: String,
    /// ISO-8601 UTC stamp, when the date could be parsed.
    #[serde(default)]
    pub date_utc: Option<String>,
    pub word_count: usize,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// A content error found while rendering; never aborts the render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub part_slug: Option<String>,
    /// The source text that triggered it, if any.
    pub pattern: Option<String>,
}
