//! Bibliography entries and `~[Citation, note]` links to them.
//!
//! Entries come from the `biblio` part and from a trailing region in any
//! other part, opened by a line of underscores:
//!
//! ```text
//! Body text.
//!
//! ___
//!
//! Author, A. 2000. Title. Publisher.
//! ```

use folio_types::{Numbering, Parts, BIBLIO_SLUG, INDEX_SLUG};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::counters::Counter;
use crate::error::{ContentProblem, Result};
use crate::geometry::get_sentences;
use crate::grammar::{punctuation_class, split_trailing_punctuation};
use crate::inline::{self, strip_markup};
use crate::outline::Outline;
use crate::placeholders::{Placeholders, Restore, TokenCheck};
use crate::slug::slugify;
use crate::text::{get_words, natural_cmp};

static DIVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\n_{3,} *\n\n").expect("valid bibliography divider regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}").expect("valid year regex"));
static CITATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"~\[[^\]]+\]{}", punctuation_class())).expect("valid citation regex")
});

/// Split a part into its text and its bibliography region, if any.
pub fn split_bibliography(text: &str) -> (&str, Option<&str>) {
    match DIVIDER_RE.find(text) {
        Some(m) => (&text[..m.start()], Some(&text[m.end()..])),
        None => (text, None),
    }
}

fn nonempty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// `(label, remainder)`: the first sentence, plus the second when it opens
/// with a four-digit year.
pub fn split_label(entry: &str) -> (String, String) {
    let sentences = get_sentences(entry);
    let take = if sentences.len() > 1 && YEAR_RE.is_match(&sentences[1]) {
        2
    } else {
        1
    };
    let take = take.min(sentences.len());
    (sentences[..take].join(" "), sentences[take..].join(" "))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyEntry {
    pub label: String,
    pub text: String,
    /// Part the line was found in.
    pub part_slug: String,
}

/// Sort and de-duplicate lines; labels shared by several lines get a letter
/// before their final character (`Author. 2000a.`).
pub fn create_unique_labels(lines: &[(String, String)]) -> Vec<BibliographyEntry> {
    let mut seen = BTreeSet::new();
    let mut unique: Vec<&(String, String)> = Vec::new();
    let mut sorted: Vec<&(String, String)> = lines.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    for line in sorted {
        if seen.insert(line.0.as_str()) {
            unique.push(line);
        }
    }

    let mut collation: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for (entry, slug) in unique {
        let (head, tail) = split_label(entry);
        collation.entry(head).or_default().push((tail, slug.clone()));
    }

    let mut entries = Vec::new();
    for (head, tails) in collation {
        if tails.len() == 1 {
            if let Some((text, part_slug)) = tails.into_iter().next() {
                entries.push(BibliographyEntry {
                    label: head,
                    text,
                    part_slug,
                });
            }
            continue;
        }
        let Some(last) = head.chars().last() else {
            continue;
        };
        let stem = &head[..head.len() - last.len_utf8()];
        for ((text, part_slug), letter) in tails.into_iter().zip(Counter::letters()) {
            entries.push(BibliographyEntry {
                label: format!("{}{}{}", stem, letter, last),
                text,
                part_slug,
            });
        }
    }
    entries.sort_by(|a, b| a.label.cmp(&b.label));
    entries
}

#[derive(Debug, Default)]
pub struct Bibliography {
    entries: Vec<BibliographyEntry>,
    /// label -> section number -> back-links
    citations: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    counters: BTreeMap<String, Counter>,
}

impl Bibliography {
    pub fn new(parts: &Parts) -> Self {
        let mut lines = Vec::new();
        for (slug, text) in parts {
            let region = if slug == BIBLIO_SLUG {
                Some(text.as_str())
            } else {
                split_bibliography(text).1
            };
            if let Some(region) = region {
                lines.extend(nonempty_lines(region).map(|l| (l.to_string(), slug.clone())));
            }
        }
        Self {
            entries: create_unique_labels(&lines),
            citations: BTreeMap::new(),
            counters: BTreeMap::new(),
        }
    }

    pub fn entries(&self) -> &[BibliographyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label of the first entry containing every word of the citation.
    pub fn match_label(&self, citation: &str) -> Option<&str> {
        let terms = get_words(&strip_markup(citation));
        self.entries
            .iter()
            .find(|entry| {
                let haystack = format!("{} {}", entry.label.to_lowercase(), entry.text.to_lowercase());
                terms.iter().all(|term| haystack.contains(term.as_str()))
            })
            .map(|entry| entry.label.as_str())
    }

    /// Next citation mark for a part: symbols in the index, letters elsewhere.
    pub fn get_count(&mut self, part_slug: &str) -> String {
        self.counters
            .entry(part_slug.to_string())
            .or_insert_with(|| {
                if part_slug == INDEX_SLUG {
                    Counter::symbols()
                } else {
                    Counter::letters()
                }
            })
            .next()
            .unwrap_or_default()
    }

    /// Link for one citation; the back-link is kept for the end matter.
    pub fn citation(
        &mut self,
        citation: &str,
        note: &str,
        punctuation: &str,
        label: &str,
        numbering: Option<&Numbering>,
        count: &str,
    ) -> String {
        let number = numbering.map(Numbering::dotted).unwrap_or_else(|| "0".to_string());
        let nav_id = format!("{}_{}_{}", slugify(label), number, count);

        let (citation, open, close) = match citation.strip_prefix('-') {
            Some(rest) => (rest, "", ""),
            None => (citation, "(", ")"),
        };
        let mut text = inline::process(citation.trim());
        if !note.trim().is_empty() {
            text = format!("{}, {}", text, inline::process(note.trim()));
        }

        self.citations
            .entry(label.to_string())
            .or_default()
            .entry(number)
            .or_default()
            .push(format!(
                "<a id=\"ref_{id}\" href=\"#{id}\">{count}</a>",
                id = nav_id,
                count = count
            ));

        format!(
            "<a id=\"{id}\" href=\"#ref_{id}\">{open}{text}{close}{punctuation}<sup>{count}</sup></a>",
            id = nav_id,
            open = open,
            text = text,
            close = close,
            punctuation = punctuation,
            count = count
        )
    }

    /// End-matter list of entries, each followed by its back-links.
    pub fn html(&self, single_page: bool, restore: &Restore<'_>) -> Result<String> {
        if self.entries.is_empty() {
            return Ok(String::new());
        }
        let mut out = vec!["<section class=\"bibliography\">".to_string()];
        if !single_page {
            out.push("<h1><a href=\"#bibliography\">Bibliography</a></h1>".to_string());
        }
        for entry in &self.entries {
            let mut line = format!(
                "{} {}",
                inline::process(&entry.label),
                inline::process(&entry.text)
            );
            if let Some(sections) = self.citations.get(&entry.label) {
                let mut numbers: Vec<&String> = sections.keys().collect();
                numbers.sort_by(|a, b| natural_cmp(a, b));
                for number in numbers {
                    line.push_str(&format!(
                        " <b>{}</b> <span class=\"wiki-no-select\">[{}]</span>",
                        number,
                        sections[number].join(", ")
                    ));
                }
            }
            let line = restore(&entry.part_slug, &line)?;
            out.push(format!("<div class=\"indent-hanging\">{}</div>", line));
        }
        out.push("</section>".to_string());
        Ok(out.join("\n"))
    }
}

/// `~[Citation, note].` as `(citation, note, punctuation)`; the note is the
/// last comma clause.
pub fn split_pattern(pattern: &str) -> (String, String, String) {
    let (reference, punctuation) = split_trailing_punctuation(pattern);
    let (citation, note) = match reference.rsplit_once(',') {
        Some((citation, note)) => (citation.to_string(), note.trim().to_string()),
        None => (reference.to_string(), String::new()),
    };
    (citation, note, punctuation.to_string())
}

/// Placeholders for `~[...]` citations, plus the `ibid` memory.
#[derive(Debug, Clone)]
pub struct Citations {
    placeholders: Placeholders,
    ibid: Option<String>,
}

impl Citations {
    pub fn new() -> Result<Self> {
        Ok(Self {
            placeholders: Placeholders::new(CITATION_RE.as_str(), "citation")?
                .with_check(TokenCheck::Ordered),
            ibid: None,
        })
    }

    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.placeholders.insert(parts)
    }

    pub fn replace(
        &mut self,
        html_parts: &Parts,
        bibliography: &mut Bibliography,
        outline: &mut Outline,
    ) -> Result<Parts> {
        let Self { placeholders, ibid } = self;
        let order: Vec<String> = outline.iter().map(|e| e.slug.clone()).collect();
        let order: Vec<&str> = order.iter().map(String::as_str).collect();
        placeholders.replace_ordered(html_parts, &order, |pattern, slug| {
            decorate(ibid, bibliography, outline, pattern, slug)
        })
    }
}

/// `ibid` reuses the last matched label until a citation fails to match.
/// Parts are visited in outline order, so it carries across sections.
fn decorate(
    ibid: &mut Option<String>,
    bibliography: &mut Bibliography,
    outline: &mut Outline,
    pattern: &str,
    part_slug: &str,
) -> String {
    let (citation, note, punctuation) = split_pattern(pattern);
    let numbering = outline.find_numbering(part_slug).cloned();
    let label = match ibid {
        Some(previous) if slugify(&citation) == "ibid" => Some(previous.clone()),
        _ => bibliography.match_label(&citation).map(String::from),
    };
    match label {
        Some(label) => {
            *ibid = Some(label.clone());
            let count = bibliography.get_count(part_slug);
            bibliography.citation(
                &citation,
                &note,
                &punctuation,
                &label,
                numbering.as_ref(),
                &count,
            )
        }
        None => {
            *ibid = None;
            let message = if bibliography.is_empty() {
                "Citation to an empty bibliography."
            } else {
                "Citation not matched in bibliography."
            };
            outline.report(
                part_slug,
                ContentProblem::new(pattern, message).with_code("citation.unmatched"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_counters;

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn identity(_: &str, html: &str) -> Result<String> {
        Ok(html.to_string())
    }

    #[test]
    fn test_split_bibliography() {
        assert_eq!(
            split_bibliography("Body\n\n___\n\nA. 2000. X."),
            ("Body", Some("A. 2000. X."))
        );
        assert_eq!(split_bibliography("Body\n\n__\n\nA."), ("Body\n\n__\n\nA.", None));
    }

    #[test]
    fn test_split_label() {
        assert_eq!(
            split_label("Author. 2000. X."),
            ("Author. 2000.".to_string(), "X.".to_string())
        );
        assert_eq!(
            split_label("Author, A. Some Title. Publisher."),
            ("Author, A.".to_string(), "Some Title. Publisher.".to_string())
        );
    }

    #[test]
    fn test_disambiguation() {
        let doc = parts(&[("biblio", "Author. 2000. Y.\nAuthor. 2000. X.\nAuthor. 2000. X.\n")]);
        let bibliography = Bibliography::new(&doc);
        let labels: Vec<&str> = bibliography.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Author. 2000a.", "Author. 2000b."]);
        assert_eq!(bibliography.entries()[0].text, "X.");
        assert_eq!(bibliography.match_label("Author 2000"), Some("Author. 2000a."));
    }

    #[test]
    fn test_labels_are_unique() {
        let lines: Vec<(String, String)> = ["A. 2000. X.", "A. 2000. Y.", "A. 2000. Z.", "B. 1999. Q.", "A. Other."]
            .iter()
            .map(|l| (l.to_string(), "biblio".to_string()))
            .collect();
        let entries = create_unique_labels(&lines);
        let labels: BTreeSet<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels.len(), entries.len());
    }

    #[test]
    fn test_collects_trailing_regions() {
        let doc = parts(&[("part", "Text\n\n_____\n\nSmith, J. 1999. Book.")]);
        let bibliography = Bibliography::new(&doc);
        assert_eq!(bibliography.entries().len(), 1);
        assert_eq!(bibliography.entries()[0].part_slug, "part");
    }

    #[test]
    fn test_split_pattern() {
        assert_eq!(
            split_pattern("~[Author 2000, p.3]."),
            ("Author 2000".to_string(), "p.3".to_string(), ".".to_string())
        );
        assert_eq!(
            split_pattern("~[Smith]"),
            ("Smith".to_string(), String::new(), String::new())
        );
    }

    #[test]
    fn test_citation_link() {
        let doc = parts(&[("biblio", "Smith, J. 1999. Book.")]);
        let mut bibliography = Bibliography::new(&doc);
        let numbering = Numbering::from(vec!["1"]);
        let html = bibliography.citation("Smith", "p.3", ".", "Smith, J. 1999.", Some(&numbering), "a");
        assert_eq!(
            html,
            "<a id=\"smith-j-1999_1_a\" href=\"#ref_smith-j-1999_1_a\">(Smith, p.3).<sup>a</sup></a>"
        );
        let html = bibliography.citation("-Smith", "", "", "Smith, J. 1999.", Some(&numbering), "b");
        assert!(html.contains(">Smith<sup>b</sup>"));
        let end = bibliography.html(false, &identity).unwrap();
        assert!(end.contains("<b>1</b> <span class=\"wiki-no-select\">[<a id=\"ref_smith-j-1999_1_a\" href=\"#smith-j-1999_1_a\">a</a>, <a id=\"ref_smith-j-1999_1_b\" href=\"#smith-j-1999_1_b\">b</a>]</span>"));
    }

    #[test]
    fn test_index_counts_with_symbols() {
        let mut bibliography = Bibliography::default();
        assert_eq!(bibliography.get_count("index"), "*");
        assert_eq!(bibliography.get_count("index"), "†");
        assert_eq!(bibliography.get_count("part"), "a");
    }

    #[test]
    fn test_ibid_and_reset() {
        let doc = parts(&[
            ("biblio", "Smith, J. 1999. Book."),
            ("part", "Part\n\n~[Smith]. ~[ibid]. ~[Nobody]. ~[ibid]."),
        ]);
        let mut outline = Outline::new(&doc, &default_counters());
        let mut bibliography = Bibliography::new(&doc);
        let mut citations = Citations::new().unwrap();
        let inserted = citations.insert(&doc);
        let html = citations
            .replace(&inserted, &mut bibliography, &mut outline)
            .unwrap();
        let body = &html["part"];
        assert!(body.contains("<a id=\"smith-j-1999_1_a\""));
        assert!(body.contains("<a id=\"smith-j-1999_1_b\" href=\"#ref_smith-j-1999_1_b\">(ibid).<sup>b</sup></a>"));
        assert_eq!(body.matches("wr-error").count(), 2);
        assert_eq!(outline.errors()["part"].len(), 2);
    }

    #[test]
    fn test_ibid_follows_outline_order() {
        let doc = parts(&[
            ("index", "Title\n\n- Zeta\n- Alpha"),
            ("zeta", "Zeta\n\nSee ~[Smith]."),
            ("alpha", "Alpha\n\nAgain ~[ibid]."),
            ("biblio", "Smith, J. 1999. Book."),
        ]);
        let mut outline = Outline::new(&doc, &default_counters());
        let mut bibliography = Bibliography::new(&doc);
        let mut citations = Citations::new().unwrap();
        let inserted = citations.insert(&doc);
        let html = citations
            .replace(&inserted, &mut bibliography, &mut outline)
            .unwrap();
        assert!(html["zeta"].contains("<a id=\"smith-j-1999_1_a\""));
        assert!(html["alpha"].contains("<a id=\"smith-j-1999_2_a\" href=\"#ref_smith-j-1999_2_a\">(ibid).<sup>a</sup></a>"));
        assert!(outline.errors().is_empty());
    }
}
