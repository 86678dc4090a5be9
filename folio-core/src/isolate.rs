//! Text the wiki must not format: `{{verbatim}}`, `\x` escapes and `&name;`
//! entities. Each is swapped for a placeholder before formatting and put
//! back, as HTML, afterwards.

use folio_types::Parts;

use crate::error::Result;
use crate::placeholders::{Placeholders, TokenCheck};
use crate::text::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationKind {
    Verbatim,
    Backslashes,
    Entities,
}

impl IsolationKind {
    fn regex(&self) -> &'static str {
        match self {
            IsolationKind::Verbatim => r"\{\{[^}]*\}\}",
            IsolationKind::Backslashes => r"\\.",
            IsolationKind::Entities => r"&\w+;",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            IsolationKind::Verbatim => "verbatim",
            IsolationKind::Backslashes => "bs",
            IsolationKind::Entities => "en",
        }
    }

    /// HTML for one isolated pattern.
    pub fn decorate(&self, pattern: &str) -> String {
        match self {
            IsolationKind::Verbatim => {
                let inner = pattern
                    .strip_prefix("{{")
                    .and_then(|p| p.strip_suffix("}}"))
                    .unwrap_or(pattern);
                escape(inner)
            }
            IsolationKind::Backslashes => {
                let mut chars = pattern.chars();
                chars.next();
                escape(chars.as_str())
            }
            IsolationKind::Entities => pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Isolator {
    kind: IsolationKind,
    placeholders: Placeholders,
}

impl Isolator {
    pub fn new(kind: IsolationKind) -> Result<Self> {
        Ok(Self {
            kind,
            placeholders: Placeholders::new(kind.regex(), kind.marker())?.with_check(TokenCheck::Copied),
        })
    }

    pub fn verbatim() -> Result<Self> {
        Self::new(IsolationKind::Verbatim)
    }

    pub fn backslashes() -> Result<Self> {
        Self::new(IsolationKind::Backslashes)
    }

    pub fn entities() -> Result<Self> {
        Self::new(IsolationKind::Entities)
    }

    pub fn kind(&self) -> IsolationKind {
        self.kind
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    pub fn replace(&self, html_parts: &Parts) -> Result<Parts> {
        let kind = self.kind;
        self.placeholders
            .replace(html_parts, |pattern, _| kind.decorate(pattern))
    }

    /// Restore tokens in HTML built from one part's text.
    pub fn replace_text(&self, slug: &str, html: &str) -> Result<String> {
        let kind = self.kind;
        self.placeholders
            .replace_text(slug, html, |pattern, _| kind.decorate(pattern))
    }
}
