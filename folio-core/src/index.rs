//! Tag index: `#[alias:Tag, subtag]` anchors collected into end matter.

use folio_types::{Numbering, Parts};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::counters::Counter;
use crate::error::Result;
use crate::grammar::{punctuation_class, split_trailing_punctuation};
use crate::outline::Outline;
use crate::placeholders::{Placeholders, Restore, TokenCheck};
use crate::slug::slugify;
use crate::text::{natural_cmp, one_line};

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"[#%]\[[^\]]+\]{}", punctuation_class())).expect("valid tag regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub alias: String,
    pub tag: String,
    pub subtag: String,
    pub punctuation: String,
}

/// Parse `#[alias:Tag, subtag].`; `#` lowercases tag and subtag, `%` keeps
/// their case. The alias defaults to the tag as typed.
pub fn split_pattern(pattern: &str) -> TagPattern {
    let (reference, punctuation) = split_trailing_punctuation(pattern);
    let (alias, tags) = match reference.rsplit_once(':') {
        Some((alias, tags)) => (Some(alias), tags),
        None => (None, reference),
    };
    let (tag, subtag) = tags.split_once(", ").unwrap_or((tags, ""));
    let alias = alias.unwrap_or(tag).to_string();
    let (tag, subtag) = if pattern.starts_with('#') {
        (tag.to_lowercase(), subtag.to_lowercase())
    } else {
        (tag.to_string(), subtag.to_string())
    };
    TagPattern {
        alias,
        tag,
        subtag,
        punctuation: punctuation.to_string(),
    }
}

/// Anchor id: the non-empty items of tag, subtag, number and count.
pub fn get_nav_id(tag: &str, subtag: &str, number: &str, count: &str) -> String {
    [slugify(tag), slugify(subtag), number.to_string(), count.to_string()]
        .into_iter()
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone)]
struct Backlink {
    part_slug: String,
    html: String,
}

/// tag -> subtag -> section number -> back-links.
#[derive(Debug, Default)]
pub struct Index {
    tags: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<Backlink>>>>,
    counters: BTreeMap<String, Counter>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Next mark for a part, in lowercase roman.
    pub fn get_count(&mut self, part_slug: &str) -> String {
        self.counters
            .entry(part_slug.to_string())
            .or_insert_with(Counter::roman)
            .next()
            .unwrap_or_default()
    }

    /// Link for one tag; the back-link is kept for the end matter.
    pub fn tag(
        &mut self,
        pattern: &TagPattern,
        part_slug: &str,
        numbering: Option<&Numbering>,
        count: &str,
    ) -> String {
        let alias = one_line(&pattern.alias);
        let tag = one_line(&pattern.tag);
        let subtag = one_line(&pattern.subtag);
        let number = numbering.map(Numbering::dotted).unwrap_or_else(|| "0".to_string());
        let nav_id = get_nav_id(&tag, &subtag, &number, count);

        self.tags
            .entry(tag)
            .or_default()
            .entry(subtag)
            .or_default()
            .entry(number)
            .or_default()
            .push(Backlink {
                part_slug: part_slug.to_string(),
                html: format!("<a id=\"ref_{id}\" href=\"#{id}\">{count}</a>", id = nav_id, count = count),
            });

        format!(
            "<a id=\"{id}\" href=\"#ref_{id}\">{alias}{punctuation}<sup>{count}</sup></a>",
            id = nav_id,
            alias = alias,
            punctuation = pattern.punctuation,
            count = count
        )
    }

    /// End-matter index in three columns; empty when nothing was tagged.
    pub fn html(&self, single_page: bool, restore: &Restore<'_>) -> Result<String> {
        if self.tags.is_empty() {
            return Ok(String::new());
        }
        let mut out = vec!["<section id=\"index\">".to_string()];
        if !single_page {
            out.push("<h1><a href=\"#index\">Index</a></h1>".to_string());
        }
        out.push("<div class=\"columns-x3\">".to_string());
        for (tag, subtags) in sorted_case_insensitive(&self.tags) {
            out.push("<div class=\"no-column-break\">".to_string());
            out.push(format!("<div class=\"indent-hanging\">{}</div>", tag));
            for (subtag, numbers) in sorted_case_insensitive(subtags) {
                let mut line = subtag.to_string();
                let mut keys: Vec<&String> = numbers.keys().collect();
                keys.sort_by(|a, b| natural_cmp(a, b));
                for number in keys {
                    let mut links = Vec::new();
                    for backlink in &numbers[number] {
                        links.push(restore(&backlink.part_slug, &backlink.html)?);
                    }
                    line.push_str(&format!(" <b>{}</b> {}.", number, links.join(", ")));
                }
                out.push(format!("<div class=\"indent-first-line\">{}</div>", line.trim_start()));
            }
            out.push("</div>".to_string());
        }
        out.push("</div>".to_string());
        out.push("</section>".to_string());
        Ok(out.join("\n"))
    }
}

fn sorted_case_insensitive<V>(map: &BTreeMap<String, V>) -> Vec<(&String, &V)> {
    let mut items: Vec<(&String, &V)> = map.iter().collect();
    items.sort_by_key(|(key, _)| key.to_lowercase());
    items
}

/// Placeholders for `#[...]` and `%[...]` tags.
#[derive(Debug, Clone)]
pub struct Tags {
    placeholders: Placeholders,
}

impl Tags {
    pub fn new() -> Result<Self> {
        Ok(Self {
            placeholders: Placeholders::new(TAG_RE.as_str(), "tag")?.with_check(TokenCheck::Ordered),
        })
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    pub fn replace(&self, html_parts: &Parts, index: &mut Index, outline: &Outline) -> Result<Parts> {
        let order: Vec<&str> = outline.iter().map(|e| e.slug.as_str()).collect();
        self.placeholders.replace_ordered(html_parts, &order, |pattern, slug| {
            let count = index.get_count(slug);
            index.tag(&split_pattern(pattern), slug, outline.find_numbering(slug), &count)
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

    #[test]
    fn test_split_pattern() {
        assert_eq!(
            split_pattern("#[Rust:Languages, Systems]."),
            TagPattern {
                alias: "Rust".to_string(),
                tag: "languages".to_string(),
                subtag: "systems".to_string(),
                punctuation: ".".to_string(),
            }
        );
        let pattern = split_pattern("%[Ada Lovelace]");
        assert_eq!(pattern.alias, "Ada Lovelace");
        assert_eq!(pattern.tag, "Ada Lovelace");
        assert_eq!(pattern.subtag, "");
        assert_eq!(pattern.punctuation, "");
    }

    #[test]
    fn test_nav_id_skips_empty_items() {
        assert_eq!(get_nav_id("Tag One", "", "1.2", "iii"), "tag-one_1.2_iii");
        assert_eq!(get_nav_id("t", "s", "0", "i"), "t_s_0_i");
    }

    #[test]
    fn test_tags_link_and_index() {
        let doc: Parts = [("a", "A\n\nFirst #[Zebra], then %[apple, red] and #[zebra]!")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let outline = Outline::new(&doc, &default_counters());
        let mut index = Index::new();
        let mut tags = Tags::new().unwrap();
        let inserted = tags.insert(&doc);
        let html = tags.replace(&inserted, &mut index, &outline).unwrap();

        let body = &html["a"];
        assert!(body.contains("<a id=\"zebra_1_i\" href=\"#ref_zebra_1_i\">Zebra,<sup>i</sup></a>"));
        assert!(body.contains("<a id=\"zebra_1_iii\" href=\"#ref_zebra_1_iii\">zebra!<sup>iii</sup></a>"));

        let end = index.html(true, &identity).unwrap();
        assert!(!end.contains("<h1>"));
        assert!(end.find(">apple<").unwrap() < end.find(">zebra<").unwrap());
        assert!(end.contains(
            "<div class=\"indent-first-line\"><b>1</b> <a id=\"ref_zebra_1_i\" href=\"#zebra_1_i\">i</a>, <a id=\"ref_zebra_1_iii\" href=\"#zebra_1_iii\">iii</a>.</div>"
        ));
        assert!(end.contains("<div class=\"indent-first-line\">red <b>1</b>"));
    }

    #[test]
    fn test_empty_index() {
        assert_eq!(Index::new().html(false, &identity).unwrap(), "");
    }
}
