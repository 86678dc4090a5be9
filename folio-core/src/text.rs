//! Small text helpers shared by every pass.

use folio_types::Parts;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::placeholders::strip_delimiters;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+").expect("valid word regex"));
static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid term regex"));

/// Normalize line endings, strip placeholder delimiters, and trim.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    strip_delimiters(&normalized).trim().to_string()
}

/// A cleaned document plus any image file keys set aside from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanDocument {
    pub parts: Parts,
    pub files: Vec<String>,
}

/// Clean every part; `index.txt` becomes `index`, image keys go to `files`,
/// other dotted keys are dropped.
pub fn clean_document(parts: &BTreeMap<String, String>) -> CleanDocument {
    let mut out = CleanDocument::default();
    for (key, text) in parts {
        let pieces: Vec<&str> = key.split('.').collect();
        match pieces.as_slice() {
            [slug] => {
                out.parts.insert(slug.to_string(), clean_text(text));
            }
            [slug, "txt"] => {
                out.parts.insert(slug.to_string(), clean_text(text));
            }
            [_, "png"] | [_, "jpg"] => out.files.push(key.clone()),
            _ => {}
        }
    }
    out
}

/// All whitespace runs become a single space.
pub fn one_line(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Approximate word count.
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Lowercase words for matching against other strings.
///
/// "Fred's shed" becomes `["freds", "shed"]`.
pub fn get_words(text: &str) -> Vec<String> {
    let cleaned = text
        .replace(['\'', '’'], "")
        .replace('_', " ")
        .to_lowercase();
    TERM_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Escape `<`, `>` and `&` only; quotes stay as typed so typography can pair
/// them.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full escape, for attribute values and verbatim text.
pub fn escape(text: &str) -> String {
    html_escape(text)
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// `"(opt1,opt 2 , opt  3) "` becomes `["opt1", "opt 2", "opt  3"]`.
pub fn split_options(options: &str) -> Vec<String> {
    let inner = options.trim_matches(|c: char| c == '(' || c == ')' || c == ' ');
    inner
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize a CSS width option to `N%`, `Nem` (clamped 1-99) or `auto`.
pub fn css_dimension(value: &str) -> String {
    let clamp = |digits: &str| -> i64 { digits.trim().parse::<i64>().unwrap_or(1).clamp(1, 99) };
    if let Some(number) = value.strip_suffix('%') {
        format!("{}%", clamp(number))
    } else if let Some(number) = value.strip_suffix("em") {
        format!("{}em", clamp(number))
    } else {
        "auto".to_string()
    }
}

/// The first width-like option (`50%`, `20em`), normalized.
pub fn dimension_option(options: &[String]) -> Option<String> {
    options
        .iter()
        .find(|o| o.ends_with('%') || o.ends_with("em"))
        .map(|o| css_dimension(o))
}

/// Collapse whitespace and cut on a word boundary to at most `width`
/// characters, appending `...` when cut.
pub fn shorten(text: &str, width: usize) -> String {
    let single = one_line(text);
    if single.chars().count() <= width {
        return single;
    }
    let placeholder = "...";
    let mut out = String::new();
    for word in single.split(' ') {
        let candidate_len = out.chars().count()
            + usize::from(!out.is_empty())
            + word.chars().count()
            + placeholder.len();
        if candidate_len > width {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        return placeholder.to_string();
    }
    out.push_str(placeholder);
    out
}

/// "1 word", "3 words".
pub fn pluralize(number: usize, singular: &str, plural: Option<&str>) -> String {
    if number == 1 {
        format!("{} {}", number, singular)
    } else {
        match plural {
            Some(plural) => format!("{} {}", number, plural),
            None => format!("{} {}s", number, singular),
        }
    }
}

/// Thousands separators: 12345 becomes "12,345".
pub fn format_count(number: usize) -> String {
    let digits = number.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Order dotted section numbers so that `2` sorts before `10`.
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => {
                let order = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if order != std::cmp::Ordering::Equal {
                    return order;
                }
            }
        }
    }
}

/// Deterministic source of one-shot slugs, such as anonymous demo ids.
///
/// SplitMix64; the same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SlugSequence {
    state: u64,
}

impl SlugSequence {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// `prefix` followed by a nine-digit number.
    pub fn next_slug(&mut self, prefix: &str) -> String {
        let number = 100_000_000 + self.next_u64() % 900_000_000;
        format!("{}{}", prefix, number)
    }
}
