//! `DEMO` blocks: wiki source shown beside its own rendered output.
//!
//! ```text
//! DEMO (wide) ---
//! *[Bold] text.
//! ---
//! ```

use folio_types::{Parts, INDEX_SLUG};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::grammar::DELIMITERS;
use crate::placeholders::{Placeholders, TokenCheck};
use crate::settings::Settings;
use crate::text::{escape, split_options, SlugSequence};
use crate::wiki::{RenderOptions, Wiki};

/// One alternative per fence character, since the closing fence has to
/// repeat the opening one.
static DEMO_PATTERN: Lazy<String> = Lazy::new(|| {
    let fences: Vec<String> = DELIMITERS
        .chars()
        .map(|d| {
            let fence = regex::escape(&d.to_string().repeat(3));
            format!(r"{fence}\s*\n.+?\n{fence}", fence = fence)
        })
        .collect();
    format!(r"DEMO\s+(\([^)]+\)\s)?\s*(?:{})", fences.join("|"))
});

static OPTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DEMO\s+(\([^)]+\)\s)?").expect("valid demo options regex"));

/// Options from the first line of a demo block.
pub fn match_demo_options(pattern: &str) -> Vec<String> {
    OPTIONS_RE
        .captures(pattern)
        .and_then(|caps| caps.get(1))
        .map(|m| split_options(m.as_str()))
        .unwrap_or_default()
}

/// The lines between the fences.
pub fn demo_source(pattern: &str) -> String {
    let lines: Vec<&str> = pattern.lines().collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n")
}

#[derive(Debug, Clone)]
pub struct Demo {
    placeholders: Placeholders,
    settings: Settings,
    config: EngineConfig,
    slugs: SlugSequence,
}

impl Demo {
    /// Demo output renders with copies of these settings and config.
    pub fn new(settings: &Settings, config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            placeholders: Placeholders::new(&DEMO_PATTERN, "demo")?.with_check(TokenCheck::Ordered),
            settings: settings.clone(),
            config: config.clone(),
            slugs: SlugSequence::new(config.seed),
        })
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    /// Render every demo block into its source/output panel.
    pub fn replace(&mut self, html_parts: &Parts) -> Result<Parts> {
        let Self {
            placeholders,
            settings,
            config,
            slugs,
        } = self;
        placeholders.replace(html_parts, |pattern, _| {
            render_demo(pattern, settings, config, slugs)
        })
    }

    /// Put the demo blocks back exactly as written.
    pub fn restore(&self, parts: &Parts) -> Result<Parts> {
        self.placeholders
            .replace(parts, |pattern, _| pattern.to_string())
    }
}

fn render_demo(
    pattern: &str,
    settings: &Settings,
    config: &EngineConfig,
    slugs: &mut SlugSequence,
) -> String {
    let options = match_demo_options(pattern);
    let wide = if options.iter().any(|o| o == "wide") {
        "-wide"
    } else {
        ""
    };
    let as_index = options.iter().any(|o| o == INDEX_SLUG);
    let slug = if as_index {
        INDEX_SLUG.to_string()
    } else {
        slugs.next_slug("demo-")
    };
    let source = demo_source(pattern);

    let mut parts = Parts::new();
    parts.insert(slug, source.clone());
    let mut wiki = Wiki::with_settings(config.clone(), settings.clone());
    let render_options = RenderOptions {
        fragment: !as_index,
        preview: false,
    };
    let output = match wiki.process(&parts, render_options) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "demo block failed to render");
            format!("<kbd class=\"wr-error\">{}</kbd>", escape(&err.to_string()))
        }
    };

    [
        format!("<div class=\"wiki-demo{} space\">", wide),
        "<div class=\"wiki-demo-source\">".to_string(),
        format!("<pre>{}</pre>", escape(&source)),
        "</div>".to_string(),
        "<div class=\"wiki-demo-output\">".to_string(),
        output,
        "</div>".to_string(),
        "</div>".to_string(),
    ]
    .join("\n")
}
