//! Splitting line-prefixed text into flat, keyed and nested structures.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::text::one_line;

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^.?!:]*[.?!:]["'\s]*"#).expect("valid sentence regex"));

/// A nested list item, as produced by `split_to_recursive_array`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested {
    Item(String),
    List(Vec<Nested>),
}

/// Line splitters compiled so far, keyed by prefix set.
static SPLITTERS: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn char_class(prefixes: &str) -> String {
    prefixes
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect()
}

fn splitter(prefixes: &str) -> Option<Regex> {
    let mut splitters = SPLITTERS.lock();
    if let Some(re) = splitters.get(prefixes) {
        return Some(re.clone());
    }
    let re = Regex::new(&format!(r"\n([{}]) ?", char_class(prefixes))).ok()?;
    splitters.insert(prefixes.to_string(), re.clone());
    Some(re)
}

/// Split a line-prefixed block into `(prefix, line)` pairs.
///
/// ```text
/// ? This
/// / is
/// ? a block
/// ```
///
/// with prefixes `?/` gives `[('?', "This"), ('/', "is"), ('?', "a block")]`.
/// Text that does not open with a prefix is attributed to the first prefix.
/// Each line is normalized to a single line.
pub fn split_to_array(text: &str, prefixes: &str) -> Vec<(char, String)> {
    let Some(default_prefix) = prefixes.chars().next() else {
        return vec![];
    };
    let (first_prefix, content) = match text.chars().next() {
        Some(c) if prefixes.contains(c) => {
            let rest = &text[c.len_utf8()..];
            (c, rest.strip_prefix(' ').unwrap_or(rest))
        }
        _ => (default_prefix, text),
    };

    let Some(splitter) = splitter(prefixes) else {
        return vec![(first_prefix, one_line(content))];
    };

    let mut out = Vec::new();
    let mut prefix = first_prefix;
    let mut cursor = 0;
    for caps in splitter.captures_iter(content) {
        let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push((prefix, one_line(&content[cursor..whole.start()])));
        prefix = marker.as_str().chars().next().unwrap_or(default_prefix);
        cursor = whole.end();
    }
    out.push((prefix, one_line(&content[cursor..])));
    out
}

/// Like `split_to_array`, dropping the prefixes.
pub fn split_to_lines(text: &str, prefixes: &str) -> Vec<String> {
    split_to_array(text, prefixes)
        .into_iter()
        .map(|(_, line)| line)
        .collect()
}

/// Keyed lines:
///
/// ```text
/// $ KEY1 = value1
/// $ KEY2 = value2
///   + continued
/// ```
///
/// gives `{"KEY1": "value1", "KEY2": "value2 + continued"}`.
pub fn split_to_dictionary(text: &str, prefix: char, delimiter: char) -> BTreeMap<String, String> {
    let separator = format!(" {} ", delimiter);
    let mut out = BTreeMap::new();
    for (_, line) in split_to_array(text, &prefix.to_string()) {
        let pieces: Vec<&str> = line.split(separator.as_str()).collect();
        if let [key, value] = pieces.as_slice() {
            out.insert(key.trim().to_string(), one_line(value));
        }
    }
    out
}

/// Split bullets into nested lists by repeated prefixes:
///
/// ```text
/// - X
/// - - Y
/// - Z
/// ```
///
/// gives `[Item(X), List([Item(Y)]), Item(Z)]`.
pub fn split_to_recursive_array(text: &str, prefix: char) -> Vec<Nested> {
    let lines = split_to_lines(text, &format!("{} ", prefix));
    collate_lines_by_prefix(&lines, &format!("{} ", prefix))
}

fn collate_lines_by_prefix(lines: &[String], prefix: &str) -> Vec<Nested> {
    let mut array = Vec::new();
    let mut inner: Vec<String> = Vec::new();
    for line in lines {
        if let Some(rest) = line.strip_prefix(prefix) {
            inner.push(rest.to_string());
        } else {
            if !inner.is_empty() {
                array.push(Nested::List(collate_lines_by_prefix(&inner, prefix)));
                inner.clear();
            }
            array.push(Nested::Item(line.clone()));
        }
    }
    if !inner.is_empty() {
        array.push(Nested::List(collate_lines_by_prefix(&inner, prefix)));
    }
    array
}

/// Depth-first items of a nested list.
pub fn flatten(items: &[Nested]) -> Vec<String> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Nested::Item(text) => out.push(text.clone()),
            Nested::List(list) => out.extend(flatten(list)),
        }
    }
    out
}

/// Sentences, each keeping its closing punctuation and quotes.
pub fn get_sentences(text: &str) -> Vec<String> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Paragraphs separated by two or more newlines.
pub fn get_paragraphs(text: &str) -> Vec<String> {
    text.trim()
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_to_array() {
        let text = "? This\n/ is\n? \n/ a block";
        assert_eq!(
            split_to_array(text, "?/="),
            vec![
                ('?', "This".to_string()),
                ('/', "is".to_string()),
                ('?', "".to_string()),
                ('/', "a block".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_to_array_continuation_lines_join() {
        let text = "> A quote\nthat wraps\n= Caption";
        assert_eq!(
            split_to_array(text, ">="),
            vec![('>', "A quote that wraps".to_string()), ('=', "Caption".to_string())]
        );
    }

    #[test]
    fn test_split_to_array_without_leading_prefix() {
        assert_eq!(split_to_lines("plain", "^"), vec!["plain"]);
    }

    #[test]
    fn test_splitter_is_compiled_once_per_prefix_set() {
        let first = split_to_array("* a\n# b", "*#");
        let second = split_to_array("# c\n* d", "*#");
        assert_eq!(first, vec![('*', "a".to_string()), ('#', "b".to_string())]);
        assert_eq!(second, vec![('#', "c".to_string()), ('*', "d".to_string())]);
        assert!(SPLITTERS.lock().contains_key("*#"));
    }

    #[test]
    fn test_split_to_dictionary() {
        let text = "$ AUTHOR = Me / Here\n+ You / There\n$ DATE = 2017-06-12\n$ BROKEN";
        let settings = split_to_dictionary(text, '$', '=');
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["AUTHOR"], "Me / Here + You / There");
        assert_eq!(settings["DATE"], "2017-06-12");
    }

    #[test]
    fn test_split_to_recursive_array() {
        let text = "- X\n- - Y\n- - - W\n- Z";
        let nested = split_to_recursive_array(text, '-');
        assert_eq!(
            nested,
            vec![
                Nested::Item("X".into()),
                Nested::List(vec![
                    Nested::Item("Y".into()),
                    Nested::List(vec![Nested::Item("W".into())]),
                ]),
                Nested::Item("Z".into()),
            ]
        );
        assert_eq!(flatten(&nested), vec!["X", "Y", "W", "Z"]);
    }

    #[test]
    fn test_get_sentences() {
        assert_eq!(
            get_sentences("Author. 2000. \"A Title.\" Publisher."),
            vec!["Author.", "2000.", "\"A Title.\"", "Publisher."]
        );
    }

    #[test]
    fn test_get_paragraphs() {
        assert_eq!(get_paragraphs("a\n\n\nb\n\nc"), vec!["a", "b", "c"]);
    }
}
