//! Placeholders: isolate regions of text from wiki processing.
//!
//! `insert` swaps every match of a pattern for a token `⚡marker:n⚡` (n
//! counts from 1 within each part) and keeps the matched text. After the
//! wiki has turned the parts into HTML, `replace` swaps each token for a
//! decorated version of the text it stood for. The delimiter never occurs
//! in source text: `clean_text` strips it before anything is inserted.

use folio_types::Parts;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::error::{Result, WikiError};

/// Puts isolated text back into end-matter HTML built from a part's source:
/// `restore(part_slug, html)`.
pub type Restore<'a> = dyn Fn(&str, &str) -> Result<String> + 'a;

/// High Voltage, U+26A1.
pub const DELIMITER: char = '⚡';

static ANY_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*⚡\w+:\d+⚡\s*$").expect("valid token regex"));

/// Remove every delimiter character from source text.
pub fn strip_delimiters(text: &str) -> String {
    text.replace(DELIMITER, "")
}

/// True when the text holds only a placeholder token.
pub fn is_placeholder(text: &str) -> bool {
    ANY_TOKEN_RE.is_match(text)
}

/// What `replace` demands of the tokens it finds in a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenCheck {
    /// Every stored token appears exactly once, in order.
    #[default]
    Exact,
    /// Tokens appear at most once and in order. Tokens in blocks with no
    /// body output (settings, footnote bodies, bibliography regions,
    /// comments) may be missing.
    Ordered,
    /// Tokens may also repeat or move, since settings substitution copies
    /// isolated source text. Only the ordinals are checked.
    Copied,
}

#[derive(Debug, Clone)]
pub struct Placeholders {
    marker: String,
    pattern: Regex,
    token_re: Regex,
    check: TokenCheck,
    patterns: BTreeMap<String, Vec<String>>,
}

impl Placeholders {
    /// `regex` is compiled multi-line with `.` matching newlines.
    pub fn new(regex: &str, marker: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("(?ms){}", regex))?;
        let token_re = Regex::new(&format!(
            "{d}{m}:(\\d+){d}",
            d = DELIMITER,
            m = regex::escape(marker)
        ))?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
            token_re,
            check: TokenCheck::default(),
            patterns: BTreeMap::new(),
        })
    }

    pub fn with_check(mut self, check: TokenCheck) -> Self {
        self.check = check;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Token standing in for the nth match of a part.
    pub fn token(&self, ordinal: usize) -> String {
        format!("{d}{}:{}{d}", self.marker, ordinal, d = DELIMITER)
    }

    /// Replace every match with a token; remember what each token stood for.
    pub fn insert(&mut self, parts: &Parts) -> Parts {
        self.patterns.clear();
        let mut new_parts = Parts::new();
        for (slug, text) in parts {
            let mut stored = Vec::new();
            let mut new_text = String::with_capacity(text.len());
            let mut cursor = 0;
            for m in self.pattern.find_iter(text) {
                stored.push(m.as_str().to_string());
                new_text.push_str(&text[cursor..m.start()]);
                new_text.push_str(&self.token(stored.len()));
                cursor = m.end();
            }
            new_text.push_str(&text[cursor..]);
            self.patterns.insert(slug.clone(), stored);
            new_parts.insert(slug.clone(), new_text);
        }
        new_parts
    }

    /// Replace tokens with `decorator(original_match, part_slug)`, part by
    /// part in slug order.
    ///
    /// Tokens are checked against what `insert` stored, per the
    /// [`TokenCheck`] this set was built with; any drift fails the call.
    pub fn replace<F>(&self, html_parts: &Parts, decorator: F) -> Result<Parts>
    where
        F: FnMut(&str, &str) -> String,
    {
        self.replace_ordered(html_parts, &[], decorator)
    }

    /// Like [`replace`](Self::replace), but the parts named in `order` are
    /// decorated first, in that order. Decorators that carry state from one
    /// part to the next (`ibid`, counters) see the parts as readers do.
    pub fn replace_ordered<F>(&self, html_parts: &Parts, order: &[&str], mut decorator: F) -> Result<Parts>
    where
        F: FnMut(&str, &str) -> String,
    {
        let mut new_parts = Parts::new();
        for slug in order {
            if let Some(html) = html_parts.get(*slug) {
                let out = self.replace_part(slug, html, self.check, &mut decorator)?;
                new_parts.insert(slug.to_string(), out);
            }
        }
        for (slug, html) in html_parts {
            if !new_parts.contains_key(slug) {
                let out = self.replace_part(slug, html, self.check, &mut decorator)?;
                new_parts.insert(slug.clone(), out);
            }
        }
        Ok(new_parts)
    }

    fn replace_part<F>(&self, slug: &str, html: &str, check: TokenCheck, decorator: &mut F) -> Result<String>
    where
        F: FnMut(&str, &str) -> String,
    {
        let stored = self.patterns.get(slug);
        let mismatch = |stored: usize, found: usize| WikiError::PlaceholderMismatch {
            marker: self.marker.clone(),
            slug: slug.to_string(),
            stored,
            found,
        };

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        let mut previous = 0;
        let mut consumed = 0;
        for caps in self.token_re.captures_iter(html) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let ordinal: usize = number.as_str().parse().unwrap_or(0);
            let Some(stored) = stored else {
                return Err(WikiError::UnknownPart {
                    marker: self.marker.clone(),
                    slug: slug.to_string(),
                });
            };
            let Some(pattern) = ordinal.checked_sub(1).and_then(|i| stored.get(i)) else {
                return Err(mismatch(stored.len(), ordinal));
            };
            if check != TokenCheck::Copied && ordinal <= previous {
                return Err(mismatch(stored.len(), ordinal));
            }
            previous = ordinal;
            consumed += 1;
            out.push_str(&html[cursor..whole.start()]);
            out.push_str(&decorator(pattern, slug));
            cursor = whole.end();
        }
        out.push_str(&html[cursor..]);

        let expected = stored.map(Vec::len).unwrap_or(0);
        if check == TokenCheck::Exact && consumed != expected {
            return Err(mismatch(expected, consumed));
        }
        Ok(out)
    }

    /// Decorate the tokens of a single text belonging to `slug`.
    ///
    /// End matter holds any subset of a part's tokens in its own order, so
    /// only the ordinals are checked.
    pub fn replace_text<F>(&self, slug: &str, text: &str, mut decorator: F) -> Result<String>
    where
        F: FnMut(&str, &str) -> String,
    {
        self.replace_part(slug, text, TokenCheck::Copied, &mut decorator)
    }

    /// Total stored patterns across all parts.
    pub fn len(&self) -> usize {
        self.patterns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored patterns for one part, in source order.
    pub fn patterns(&self, slug: &str) -> &[String] {
        self.patterns.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_tokens_count_per_part() {
        let mut ph = Placeholders::new(r"\{\{[^}]*\}\}", "verbatim").unwrap();
        let out = ph.insert(&parts(&[("a", "x {{1}} y {{2}}"), ("b", "{{3}}")]));
        assert_eq!(out["a"], "x ⚡verbatim:1⚡ y ⚡verbatim:2⚡");
        assert_eq!(out["b"], "⚡verbatim:1⚡");
        assert_eq!(ph.len(), 3);
        assert_eq!(ph.patterns("a"), &["{{1}}".to_string(), "{{2}}".to_string()]);
    }

    #[test]
    fn test_round_trip_with_identity() {
        let inputs = [
            "plain text",
            "\\* and \\[ escaped",
            "multi\nline \\\n text",
            "",
        ];
        for input in inputs {
            let mut ph = Placeholders::new(r"\\.", "bs").unwrap();
            let source = parts(&[("p", input)]);
            let inserted = ph.insert(&source);
            let restored = ph.replace(&inserted, |pattern, _| pattern.to_string()).unwrap();
            assert_eq!(restored, source);
        }
    }

    #[test]
    fn test_decorator_sees_slug() {
        let mut ph = Placeholders::new(r"&\w+;", "en").unwrap();
        let inserted = ph.insert(&parts(&[("one", "a &amp; b")]));
        let html = ph
            .replace(&inserted, |pattern, slug| format!("[{}:{}]", slug, pattern))
            .unwrap();
        assert_eq!(html["one"], "a [one:&amp;] b");
    }

    #[test]
    fn test_unknown_ordinal_fails_loudly() {
        let mut ph = Placeholders::new(r"\\.", "bs").unwrap();
        ph.insert(&parts(&[("p", "\\x")]));
        let drifted = parts(&[("p", "⚡bs:1⚡ ⚡bs:2⚡")]);
        let err = ph.replace(&drifted, |p, _| p.to_string()).unwrap_err();
        assert!(matches!(err, WikiError::PlaceholderMismatch { stored: 1, found: 2, .. }));
    }

    #[test]
    fn test_repeated_token_fails() {
        let mut ph = Placeholders::new(r"\\.", "bs").unwrap();
        ph.insert(&parts(&[("p", "\\a \\b \\c")]));
        let drifted = parts(&[("p", "⚡bs:3⚡ ⚡bs:3⚡")]);
        let err = ph.replace(&drifted, |p, _| p.to_string()).unwrap_err();
        assert!(matches!(err, WikiError::PlaceholderMismatch { stored: 3, found: 3, .. }));
    }

    #[test]
    fn test_reordered_tokens_fail() {
        let mut ph = Placeholders::new(r"\\.", "bs").unwrap().with_check(TokenCheck::Ordered);
        ph.insert(&parts(&[("p", "\\a \\b")]));
        let drifted = parts(&[("p", "⚡bs:2⚡ ⚡bs:1⚡")]);
        let err = ph.replace(&drifted, |p, _| p.to_string()).unwrap_err();
        assert!(matches!(err, WikiError::PlaceholderMismatch { found: 1, .. }));
    }

    #[test]
    fn test_missing_tokens_by_check() {
        let source = parts(&[("p", "\\a \\b \\c")]);
        let dropped = parts(&[("p", "⚡bs:1⚡ ⚡bs:3⚡")]);

        let mut exact = Placeholders::new(r"\\.", "bs").unwrap();
        exact.insert(&source);
        let err = exact.replace(&dropped, |p, _| p.to_string()).unwrap_err();
        assert!(matches!(err, WikiError::PlaceholderMismatch { stored: 3, found: 2, .. }));

        let mut ordered = Placeholders::new(r"\\.", "bs").unwrap().with_check(TokenCheck::Ordered);
        ordered.insert(&source);
        let html = ordered.replace(&dropped, |p, _| p.to_string()).unwrap();
        assert_eq!(html["p"], "\\a \\c");
    }

    #[test]
    fn test_copied_tokens_may_repeat() {
        let mut ph = Placeholders::new(r"&\w+;", "en").unwrap().with_check(TokenCheck::Copied);
        ph.insert(&parts(&[("p", "&amp; &rarr;")]));
        let copied = parts(&[("p", "⚡en:2⚡ ⚡en:1⚡ ⚡en:1⚡")]);
        let html = ph.replace(&copied, |p, _| p.to_string()).unwrap();
        assert_eq!(html["p"], "&rarr; &amp; &amp;");
        assert!(ph.replace(&parts(&[("p", "⚡en:3⚡")]), |p, _| p.to_string()).is_err());
    }

    #[test]
    fn test_replace_ordered_visits_given_order_first() {
        let mut ph = Placeholders::new(r"~\[[^\]]+\]", "cite").unwrap();
        let inserted = ph.insert(&parts(&[("a", "~[one]"), ("b", "~[two]"), ("c", "~[three]")]));
        let mut seen = Vec::new();
        ph.replace_ordered(&inserted, &["c", "a"], |pattern, _| {
            seen.push(pattern.to_string());
            String::new()
        })
        .unwrap();
        assert_eq!(seen, vec!["~[three]", "~[one]", "~[two]"]);
    }

    #[test]
    fn test_tokens_in_unknown_part_fail() {
        let ph = Placeholders::new(r"\\.", "bs").unwrap();
        let err = ph
            .replace(&parts(&[("q", "⚡bs:1⚡")]), |p, _| p.to_string())
            .unwrap_err();
        assert!(matches!(err, WikiError::UnknownPart { .. }));
    }

    #[test]
    fn test_other_markers_are_left_alone() {
        let mut ph = Placeholders::new(r"\\.", "bs").unwrap();
        let inserted = ph.insert(&parts(&[("p", "\\x ⚡cr:1⚡")]));
        let html = ph.replace(&inserted, |_, _| "X".into()).unwrap();
        assert_eq!(html["p"], "X ⚡cr:1⚡");
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder(" ⚡demo:1⚡ "));
        assert!(!is_placeholder("text ⚡demo:1⚡"));
        assert!(!is_placeholder("plain"));
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("a⚡b⚡"), "ab");
    }
}
