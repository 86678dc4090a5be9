//! Slug generation and normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static HYPHENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Strip apostrophes, so "it's" becomes "its" rather than "it-s"
/// - Replace every other non-alphanumeric character with a hyphen
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use folio_core::slugify;
///
/// assert_eq!(slugify("It's a test"), "its-a-test");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let hyphenated = lowercased
        .graphemes(true)
        .filter(|g| !matches!(*g, "'" | "’" | "‘"))
        .map(|g| match g.chars().next() {
            Some(c) if c.is_alphanumeric() => g,
            _ => "-",
        })
        .collect::<String>();

    let collapsed = HYPHENS_RE.replace_all(&hyphenated, "-");

    collapsed.trim_matches('-').to_string()
}
