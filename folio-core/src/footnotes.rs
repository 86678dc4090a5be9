//! Footnotes: `^[link]` markers in the text, `^ body` lines in the same part.
//!
//! Links and bodies pair up by position within each part. Both sides carry
//! an id `<section-number>_<n>`: `link_...` in the body, `footnote_...` in
//! the end matter.

use folio_types::{Numbering, Parts};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::bibliography::split_bibliography;
use crate::blocks::BlockList;
use crate::counters::Counter;
use crate::error::{ContentProblem, Result};
use crate::geometry::split_to_lines;
use crate::grammar::{punctuation_class, split_trailing_punctuation};
use crate::inline;
use crate::outline::Outline;
use crate::placeholders::{Placeholders, Restore, TokenCheck};
use crate::text::{escape, natural_cmp};

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\^\[[^\]]+\]{}", punctuation_class())).expect("valid footnote link regex")
});
static URL_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("valid footnote url regex"));

#[derive(Debug, Clone)]
struct Backlink {
    count: u64,
    part_slug: String,
    link: String,
    body: String,
}

#[derive(Debug, Default)]
pub struct Footnotes {
    notes: BTreeMap<String, Vec<String>>,
    backlinks: BTreeMap<String, Vec<Backlink>>,
    counters: BTreeMap<String, Counter>,
}

impl Footnotes {
    /// Collect footnote bodies; a part whose link and body counts differ is
    /// recorded on the outline.
    pub fn new(parts: &Parts, outline: &mut Outline) -> Self {
        let mut notes = BTreeMap::new();
        for (slug, text) in parts {
            let (content, _) = split_bibliography(text);
            let num_links = match_links(content).len();
            let bodies = match_footnotes(content);
            let message = if bodies.len() > num_links {
                Some(format!(
                    "More footnotes than ^[link]s! (+{})",
                    bodies.len() - num_links
                ))
            } else if num_links > bodies.len() {
                Some(format!(
                    "More ^[link]s than footnotes! (+{})",
                    num_links - bodies.len()
                ))
            } else {
                None
            };
            if let Some(message) = message {
                outline.record(
                    slug,
                    ContentProblem::new("", message).with_code("footnotes.mismatch"),
                );
            }
            notes.insert(slug.clone(), bodies);
        }
        Self {
            notes,
            backlinks: BTreeMap::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Next footnote number for a part, from 1.
    pub fn get_count(&mut self, part_slug: &str) -> u64 {
        let counter = self
            .counters
            .entry(part_slug.to_string())
            .or_insert_with(Counter::numbers);
        counter.next().and_then(|n| n.parse().ok()).unwrap_or(1)
    }

    /// Link for `^[markup]` and its end-matter entry.
    ///
    /// A body that is just a URL makes the link point straight at it.
    pub fn footnote(&mut self, pattern: &str, part_slug: &str, numbering: Option<&Numbering>) -> String {
        let count = self.get_count(part_slug);
        let number = numbering.map(Numbering::dotted).unwrap_or_else(|| "0".to_string());
        let nav_id = format!("{}_{}", number, count);
        let (markup, punctuation) = split_trailing_punctuation(pattern);
        let body = self
            .notes
            .get(part_slug)
            .and_then(|notes| notes.get((count - 1) as usize))
            .cloned()
            .unwrap_or_default();

        self.backlinks.entry(number).or_default().push(Backlink {
            count,
            part_slug: part_slug.to_string(),
            link: format!(
                "<a id=\"footnote_{id}\" href=\"#link_{id}\">{count}</a>",
                id = nav_id,
                count = count
            ),
            body: body.clone(),
        });

        let target = if URL_ONLY_RE.is_match(&body) {
            escape(&body)
        } else {
            format!("#footnote_{}", nav_id)
        };
        format!(
            "<a id=\"link_{}\" href=\"{}\">{}{}<sup>{}</sup></a>",
            nav_id,
            target,
            inline::process(markup),
            punctuation,
            count
        )
    }

    pub fn is_empty(&self) -> bool {
        self.backlinks.is_empty()
    }

    /// End-matter section; empty when no footnote was linked.
    pub fn html(&self, restore: &Restore<'_>) -> Result<String> {
        if self.backlinks.is_empty() {
            return Ok(String::new());
        }
        let mut sections: Vec<(&String, &Vec<Backlink>)> = self.backlinks.iter().collect();
        sections.sort_by(|a, b| natural_cmp(a.0, b.0));

        let entry = |backlink: &Backlink| -> Result<String> {
            let body = restore(&backlink.part_slug, &inline::process(&backlink.body))?;
            Ok(format!(
                "<div class=\"indent-first-line\"><sup>{}</sup> {}</div>",
                backlink.link, body
            ))
        };

        let mut out = vec!["<section id=\"footnotes\">".to_string()];
        if sections.len() < 2 {
            for (_, backlinks) in &sections {
                for backlink in sorted(backlinks) {
                    out.push(entry(backlink)?);
                }
            }
        } else {
            out.push("<h1><a href=\"#footnotes\">Footnotes</a></h1>".to_string());
            out.push("<div class=\"columns-x2\">".to_string());
            for (number, backlinks) in &sections {
                out.push("<div class=\"no-widows\">".to_string());
                out.push(format!("<div><b>{}</b></div>", number));
                for backlink in sorted(backlinks) {
                    out.push(entry(backlink)?);
                }
                out.push("</div>".to_string());
            }
            out.push("</div>".to_string());
        }
        out.push("</section>".to_string());
        Ok(out.join("\n"))
    }
}

fn sorted(backlinks: &[Backlink]) -> Vec<&Backlink> {
    let mut out: Vec<&Backlink> = backlinks.iter().collect();
    out.sort_by_key(|b| b.count);
    out
}

/// `^[...]` markers in order.
pub fn match_links(text: &str) -> Vec<String> {
    LINK_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lines of every `^` block, in order.
pub fn match_footnotes(text: &str) -> Vec<String> {
    BlockList::parse(text)
        .find_character_blocks("^")
        .iter()
        .flat_map(|block| split_to_lines(&block.content, "^"))
        .collect()
}

/// Placeholders for `^[link]` markers.
#[derive(Debug, Clone)]
pub struct Links {
    placeholders: Placeholders,
}

impl Links {
    pub fn new() -> Result<Self> {
        Ok(Self {
            placeholders: Placeholders::new(LINK_RE.as_str(), "link")?.with_check(TokenCheck::Ordered),
        })
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    pub fn replace(&self, html_parts: &Parts, footnotes: &mut Footnotes, outline: &Outline) -> Result<Parts> {
        self.placeholders.replace(html_parts, |pattern, slug| {
            footnotes.footnote(pattern, slug, outline.find_numbering(slug))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_counters;

    fn identity(_: &str, html: &str) -> Result<String> {
        Ok(html.to_string())
    }

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_numbering_and_backlinks() {
        let doc = parts(&[("a", "A\n\nOne^[x], two^[y]. Three^[z].\n\n^ First\n^ Second\n^ Third")]);
        let mut outline = Outline::new(&doc, &default_counters());
        let mut footnotes = Footnotes::new(&doc, &mut outline);
        let mut links = Links::new().unwrap();
        let inserted = links.insert(&doc);
        let html = links.replace(&inserted, &mut footnotes, &outline).unwrap();

        let body = &html["a"];
        let positions: Vec<usize> = ["<sup>1</sup>", "<sup>2</sup>", "<sup>3</sup>"]
            .iter()
            .map(|s| body.find(s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(body.contains("<a id=\"link_1_1\" href=\"#footnote_1_1\">x,<sup>1</sup></a>"));

        let end = footnotes.html(&identity).unwrap();
        assert_eq!(end.matches("indent-first-line").count(), 3);
        for n in 1..=3 {
            assert!(end.contains(&format!("<a id=\"footnote_1_{n}\" href=\"#link_1_{n}\">{n}</a>")));
        }
        assert!(end.contains("</sup> Second</div>"));
        assert!(outline.errors().is_empty());
    }

    #[test]
    fn test_mismatch_is_recorded() {
        let doc = parts(&[("a", "A\n\nOne^[x] two^[y].\n\n^ Only one")]);
        let mut outline = Outline::new(&doc, &default_counters());
        Footnotes::new(&doc, &mut outline);
        let problems = &outline.errors()["a"];
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "More ^[link]s than footnotes! (+1)");
    }

    #[test]
    fn test_url_body_links_out() {
        let doc = parts(&[("a", "A\n\nSee^[this].\n\n^ https://example.com/page")]);
        let mut outline = Outline::new(&doc, &default_counters());
        let mut footnotes = Footnotes::new(&doc, &mut outline);
        let html = footnotes.footnote("^[this].", "a", outline.find_numbering("a"));
        assert_eq!(
            html,
            "<a id=\"link_1_1\" href=\"https://example.com/page\">this.<sup>1</sup></a>"
        );
        let end = footnotes.html(&identity).unwrap();
        assert!(end.contains("<a href=\"https://example.com/page\">"));
    }

    #[test]
    fn test_sections_are_grouped() {
        let doc = parts(&[
            ("a", "A\n\nOne^[x].\n\n^ Note a"),
            ("b", "B\n\nTwo^[y].\n\n^ Note b"),
        ]);
        let mut outline = Outline::new(&doc, &default_counters());
        let mut footnotes = Footnotes::new(&doc, &mut outline);
        footnotes.footnote("^[y].", "b", outline.find_numbering("b"));
        footnotes.footnote("^[x].", "a", outline.find_numbering("a"));
        let end = footnotes.html(&identity).unwrap();
        assert!(end.contains("<h1><a href=\"#footnotes\">Footnotes</a></h1>"));
        assert!(end.find("<b>1</b>").unwrap() < end.find("<b>2</b>").unwrap());
    }

    #[test]
    fn test_no_footnotes_no_section() {
        assert_eq!(Footnotes::default().html(&identity).unwrap(), "");
    }
}
