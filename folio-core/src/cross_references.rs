//! `@[terms]` links to the first section whose title has all the terms.

use folio_types::{Parts, OutlineElement};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::blocks::anchor_name;
use crate::error::{ContentProblem, Result};
use crate::grammar::{punctuation_class, split_trailing_punctuation};
use crate::outline::Outline;
use crate::placeholders::{Placeholders, TokenCheck};
use crate::text::{escape, get_words, html_escape};

static CROSS_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"@\[[^\]]+\]{}", punctuation_class()))
        .expect("valid cross-reference regex")
});

#[derive(Debug, Clone)]
pub struct CrossReferences {
    placeholders: Placeholders,
}

impl CrossReferences {
    pub fn new() -> Result<Self> {
        Ok(Self {
            placeholders: Placeholders::new(CROSS_REFERENCE_RE.as_str(), "cr")?
                .with_check(TokenCheck::Ordered),
        })
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    pub fn replace(&self, html_parts: &Parts, outline: &mut Outline) -> Result<Parts> {
        self.placeholders
            .replace(html_parts, |pattern, slug| decorate(outline, pattern, slug))
    }
}

/// First element whose title words include every term.
pub fn find_element<'a>(outline: &'a Outline, terms: &str) -> Option<&'a OutlineElement> {
    let terms: BTreeSet<String> = get_words(terms).into_iter().collect();
    outline.iter().find(|element| {
        let title_terms: BTreeSet<String> = get_words(&element.title).into_iter().collect();
        terms.is_subset(&title_terms)
    })
}

fn decorate(outline: &mut Outline, pattern: &str, part_slug: &str) -> String {
    let (body, punctuation) = split_trailing_punctuation(pattern);
    let (short, terms) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let Some(element) = find_element(outline, terms) else {
        outline.record(
            part_slug,
            ContentProblem::new(pattern, "Cross-reference matches no section title.")
                .with_code("cross_reference.unmatched"),
        );
        return format!("<kbd class=\"wiki-error\">{}</kbd>", escape(pattern));
    };

    let section = element.numbering.dotted();
    let href = anchor_name(&element.numbering, &element.slug);
    let link = if short {
        format!("<a class=\"unmarked\" href=\"#{}\">&sect;{}</a>", href, section)
    } else {
        format!(
            "<a class=\"unmarked\" href=\"#{}\"><i>{}</i> (&sect;{})</a>",
            href,
            html_escape(element.title.trim()),
            section
        )
    };
    format!("{}{}", link, punctuation)
}
