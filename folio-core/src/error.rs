//! Errors that abort a render.
//!
//! Content problems (unmatched citations, unknown variables and the like) are
//! not errors: they become inline markers and outline diagnostics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("A document needs at least one part")]
    EmptyDocument,

    #[error("A document can have 1-{max} parts ({found} found)")]
    TooManyParts { max: usize, found: usize },

    #[error("Only single-part documents can be fragments ({found} parts found)")]
    FragmentParts { found: usize },

    #[error("Placeholder mismatch in part '{slug}' for '{marker}': {stored} stored, {found} found")]
    PlaceholderMismatch {
        marker: String,
        slug: String,
        stored: usize,
        found: usize,
    },

    #[error("Placeholder '{marker}' has no stored patterns for part '{slug}'")]
    UnknownPart { marker: String, slug: String },

    #[error("Invalid placeholder pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Malformed export file: {0}")]
    MalformedExport(String),
}

pub type Result<T> = std::result::Result<T, WikiError>;

/// A content problem: recorded against a part, shown inline, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentProblem {
    /// Dotted kind, e.g. `citation.unmatched`.
    pub code: String,
    /// Source text that caused it; empty when the problem is part-wide.
    pub pattern: String,
    pub message: String,
}

impl ContentProblem {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: "content".to_string(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }
}
