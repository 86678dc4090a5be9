//! Document outline: part order, section numbering, word counts and the
//! table of contents. Content errors found while rendering are kept here too.

use folio_types::{Diagnostic, DiagnosticSeverity, Numbering, OutlineElement, Parts, BIBLIO_SLUG, INDEX_SLUG};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use tracing::warn;

use crate::blocks::{get_title_data, BlockList};
use crate::counters::new_counter;
use crate::error::ContentProblem;
use crate::geometry::{split_to_recursive_array, Nested};
use crate::inline;
use crate::slug::slugify;
use crate::text::{count_words, escape, format_count};

#[derive(Debug, Clone, Default)]
pub struct Outline {
    elements: Vec<OutlineElement>,
    errors: BTreeMap<String, Vec<ContentProblem>>,
}

impl Outline {
    /// Build from the index's `-` outline block, or from the sorted part
    /// slugs when there is none. The index itself comes first, numbered `0`.
    pub fn new(parts: &Parts, counters: &[String]) -> Self {
        let listed = parts
            .get(INDEX_SLUG)
            .map(|index| extract_outline(index, counters))
            .unwrap_or_default();
        let hierarchy: Vec<(Numbering, String, String, String)> = if listed.is_empty() {
            create_outline(parts)
        } else {
            listed
                .into_iter()
                .map(|(numbering, title)| {
                    let slug = slugify(&title);
                    (numbering, slug.clone(), title, slug)
                })
                .collect()
        };

        let mut elements: Vec<OutlineElement> = hierarchy
            .into_iter()
            .map(|(numbering, slug, title, title_slug)| {
                let word_count = parts.get(&slug).map(|t| count_words(t)).unwrap_or(0);
                OutlineElement {
                    numbering,
                    slug,
                    title,
                    title_slug,
                    word_count,
                }
            })
            .collect();

        if let Some(index) = parts.get(INDEX_SLUG) {
            let (slug, title, title_slug, _) = get_title_data(index, INDEX_SLUG);
            elements.insert(
                0,
                OutlineElement {
                    numbering: Numbering::index(),
                    slug,
                    title,
                    title_slug,
                    word_count: count_words(index),
                },
            );
        }

        Self {
            elements,
            errors: BTreeMap::new(),
        }
    }

    pub fn elements(&self) -> &[OutlineElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutlineElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// One element, and it is not the bibliography.
    pub fn single_page(&self) -> bool {
        self.elements.len() == 1 && self.elements.iter().all(|e| e.slug != BIBLIO_SLUG)
    }

    pub fn find_title(&self, numbering: &Numbering) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| &e.numbering == numbering)
            .map(|e| e.title.as_str())
    }

    pub fn find_numbering(&self, slug: &str) -> Option<&Numbering> {
        self.elements
            .iter()
            .find(|e| e.slug == slug)
            .map(|e| &e.numbering)
    }

    pub fn find_slug(&self, numbering: &Numbering) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| &e.numbering == numbering)
            .map(|e| e.slug.as_str())
    }

    pub fn total_word_count(&self) -> usize {
        self.elements.iter().map(|e| e.word_count).sum()
    }

    /// Keep a content problem against a part.
    pub fn record(&mut self, part_slug: &str, problem: ContentProblem) {
        warn!(
            part = part_slug,
            code = %problem.code,
            pattern = %problem.pattern,
            "{}",
            problem.message
        );
        self.errors
            .entry(part_slug.to_string())
            .or_default()
            .push(problem);
    }

    /// Record a problem and return its inline marker.
    pub fn report(&mut self, part_slug: &str, problem: ContentProblem) -> String {
        let marker = format!(
            "<kbd class=\"wr-error\" title=\"{}\">{}</kbd>",
            escape(&problem.pattern),
            escape(&problem.message)
        );
        self.record(part_slug, problem);
        marker
    }

    pub fn error(&mut self, part_slug: &str, pattern: &str, message: &str) -> String {
        self.report(part_slug, ContentProblem::new(pattern, message))
    }

    /// Problems by part slug.
    pub fn errors(&self) -> &BTreeMap<String, Vec<ContentProblem>> {
        &self.errors
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .flat_map(|(slug, problems)| {
                problems.iter().map(move |problem| Diagnostic {
                    code: problem.code.clone(),
                    message: problem.message.clone(),
                    severity: DiagnosticSeverity::Warning,
                    part_slug: Some(slug.clone()),
                    pattern: (!problem.pattern.is_empty()).then(|| problem.pattern.clone()),
                })
            })
            .collect()
    }

    /// Table of contents with word counts; parents show subtotals of their
    /// children. Listed parts with no words link to the editor instead.
    pub fn html(&self, edit_base_uri: &str) -> String {
        if self.elements.is_empty() {
            return String::new();
        }
        let max_depth = self
            .elements
            .iter()
            .map(|e| e.numbering.depth())
            .max()
            .unwrap_or(1);
        let mut out = vec![
            "<h2>Table of Contents</h2>".to_string(),
            "<table class=\"table table-of-contents table-condensed\">".to_string(),
            "<tbody>".to_string(),
        ];
        for (element, subtotal) in totalize(&self.elements) {
            let depth = element.numbering.depth();
            let mut cells = Vec::new();
            if element.slug == INDEX_SLUG {
                cells.push("<td></td>".to_string());
                cells.push(format!(
                    "<td class=\"word-count\" colspan=\"{}\">Index.</td>",
                    max_depth * 2 - 1
                ));
                cells.push(format!(
                    "<td class=\"word-count\">{}</td>",
                    format_count(element.word_count)
                ));
            } else {
                cells.extend(std::iter::repeat("<td></td>".to_string()).take(depth - 1));
                cells.push(format!(
                    "<td class=\"text-right\"><b>{}</b>.</td>",
                    element.numbering.dotted()
                ));
                let colspan = (max_depth - depth) * 2 + usize::from(subtotal == 0);
                let link = if element.word_count == 0 {
                    format!(
                        "<a href=\"{}/{}?title={}\" class=\"unmarked\"><i>[+] {}</i></a>",
                        edit_base_uri,
                        element.slug,
                        utf8_percent_encode(&element.title, QUERY_VALUE),
                        escape(&element.title)
                    )
                } else {
                    format!(
                        "<a href=\"#{}\" class=\"unmarked\">{}</a>",
                        element.anchor(),
                        inline::process(&element.title)
                    )
                };
                cells.push(format!("<td colspan=\"{}\">{}</td>", colspan, link));
                cells.push(if element.word_count == 0 {
                    "<td class=\"word-count\">&mdash;</td>".to_string()
                } else {
                    format!(
                        "<td class=\"word-count\">{}</td>",
                        format_count(element.word_count)
                    )
                });
                if subtotal != 0 {
                    cells.push(format!(
                        "<td class=\"word-count\">&nbsp;<b>{}</b></td>",
                        format_count(subtotal)
                    ));
                }
                if depth > 1 || subtotal != 0 {
                    cells.extend(
                        std::iter::repeat("<td></td>".to_string()).take(depth.saturating_sub(2)),
                    );
                }
            }
            out.push(format!("<tr>{}</tr>", cells.concat()));
        }
        out.push(format!(
            "<tr><td></td><td class=\"word-count\" colspan=\"{}\">Total words.</td><td class=\"word-count\"><b>{}</b></td></tr>",
            max_depth * 2 - 1,
            format_count(self.total_word_count())
        ));
        out.push("</tbody>".to_string());
        out.push("</table>".to_string());
        out.join("\n")
    }

    /// A note listing document parts that the outline leaves out.
    pub fn html_spare_parts(&self, parts: &Parts, edit_base_uri: &str) -> String {
        let spare = self.spare_parts(parts);
        if spare.is_empty() {
            return String::new();
        }
        let links: String = spare
            .iter()
            .map(|slug| {
                format!(
                    " • <a href=\"{}/{}\">{}</a>",
                    edit_base_uri,
                    escape(slug),
                    escape(slug)
                )
            })
            .collect();
        format!(
            "<div class=\"wiki-note\">These parts do not appear in the index's outline:{} ({}).</div>",
            links,
            spare.len()
        )
    }

    /// Parts present in the document but not in the outline.
    pub fn spare_parts<'a>(&self, parts: &'a Parts) -> Vec<&'a str> {
        parts
            .keys()
            .map(String::as_str)
            .filter(|slug| *slug != INDEX_SLUG && *slug != BIBLIO_SLUG)
            .filter(|slug| self.find_numbering(slug).is_none())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Outline {
    type Item = &'a OutlineElement;
    type IntoIter = std::slice::Iter<'a, OutlineElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Number a nested list, one counter style per depth:
///
/// `[a, [b, [c]], d]` becomes `1 a`, `1.a b`, `1.a.i c`, `2 d`.
pub fn enumerate_list(items: &[Nested], counters: &[String], prefix: &Numbering) -> Vec<(Numbering, String)> {
    let mut counter = new_counter(counters.first().map(String::as_str).unwrap_or("1"));
    let deeper = counters.get(1..).unwrap_or(&[]);
    let mut current: Option<String> = None;
    let mut out = Vec::new();
    for item in items {
        match item {
            Nested::List(sublist) => {
                let mut sub_prefix = prefix.clone();
                sub_prefix.push(current.clone().unwrap_or_else(|| "0".to_string()));
                out.extend(enumerate_list(sublist, deeper, &sub_prefix));
            }
            Nested::Item(title) => {
                let label = counter.next().unwrap_or_default();
                let mut numbering = prefix.clone();
                numbering.push(label.clone());
                current = Some(label);
                out.push((numbering, title.clone()));
            }
        }
    }
    out
}

/// Numbered titles from the first `-` block of the index.
pub fn extract_outline(text: &str, counters: &[String]) -> Vec<(Numbering, String)> {
    let blocks = BlockList::parse(text);
    match blocks.find_character_blocks("-").first() {
        Some(block) => {
            let hierarchy = split_to_recursive_array(&block.content, '-');
            enumerate_list(&hierarchy, counters, &Numbering::default())
        }
        None => vec![],
    }
}

/// Body parts in slug order, numbered 1, 2, 3.
pub fn create_outline(parts: &Parts) -> Vec<(Numbering, String, String, String)> {
    parts
        .iter()
        .filter(|(slug, _)| slug.as_str() != INDEX_SLUG && slug.as_str() != BIBLIO_SLUG)
        .enumerate()
        .map(|(i, (slug, text))| {
            let (slug, title, title_slug, _) = get_title_data(text, slug);
            (Numbering::new(vec![(i + 1).to_string()]), slug, title, title_slug)
        })
        .collect()
}

/// Pair each element with the word total of its descendants plus itself,
/// or 0 when it has no descendants.
pub fn totalize(elements: &[OutlineElement]) -> Vec<(&OutlineElement, usize)> {
    let mut subtotals: BTreeMap<Numbering, usize> = BTreeMap::new();
    let mut out = Vec::with_capacity(elements.len());
    for element in elements.iter().rev() {
        for parent in element.numbering.ancestors() {
            *subtotals.entry(parent).or_default() += element.word_count;
        }
        let subtotal = subtotals
            .get(&element.numbering)
            .map(|sum| sum + element.word_count)
            .unwrap_or(0);
        out.push((element, subtotal));
    }
    out.reverse();
    out
}

/// In index text, rename the first outline line ending in `- old`.
pub fn replace_title(text: &str, old_title: &str, new_title: &str) -> String {
    let old = format!("- {}", old_title);
    let new = format!("- {}", new_title);
    let mut matched = false;
    text.lines()
        .map(|line| {
            if !matched && line.starts_with("- ") && line.ends_with(&old) {
                matched = true;
                format!("{}{}", &line[..line.len() - old.len()], new)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(numbering, title, slug, text)` in outline order, for parts that exist.
pub fn iterate_parts(parts: &Parts, counters: &[String]) -> Vec<(Numbering, String, String, String)> {
    let outline = Outline::new(parts, counters);
    outline
        .iter()
        .filter_map(|e| {
            parts
                .get(&e.slug)
                .map(|text| (e.numbering.clone(), e.title.clone(), e.slug.clone(), text.clone()))
        })
        .collect()
}

/// Everything but the unreserved URL characters.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
