//! Single point of definition for the wiki's control characters.

/// Comments and metadata lines: no output.
pub const NULLS: &str = "%^+-";
/// Settings assignment.
pub const SETTERS: &str = "$";
pub const HEADERS: &str = "@";
pub const QUOTES: &str = ">";
/// `"` note, `'` aside.
pub const NOTES: &str = "\"'";
/// Left, center, right, indent, hanging indent, float left, float right.
pub const ALIGNS: &str = ".;,:~{}";
pub const LISTS: &str = "*#_";
/// `!` header-first table, `|` plain table.
pub const TABLES: &str = "!|";
pub const GLOSSES: &str = "/";
pub const CAPTION: char = '=';
pub const QUIZZES: &str = "?";

/// Every character that may open a character block.
pub fn all_control_chars() -> String {
    [
        NULLS, SETTERS, HEADERS, QUOTES, NOTES, ALIGNS, LISTS, TABLES, GLOSSES, "=", QUIZZES,
    ]
    .concat()
}

pub fn is_control_char(c: char) -> bool {
    all_control_chars().contains(c)
}

/// A paragraph that is exactly one of these is a divider.
pub const DIVIDERS: &[&str] = &[
    "*", "* * *", "@", "@ @ @", ".", ". . .", "-", "- - -", "=", "= = =", "~", "~ ~", "~ ~ ~",
    "~ ~ ~ ~",
];

pub fn is_divider(text: &str) -> bool {
    DIVIDERS.contains(&text)
}

/// Characters that fence function blocks when tripled.
pub const DELIMITERS: &str = "-=>+:%\"/";

/// Trailing punctuation absorbed by bracketed references.
pub const PUNCTUATION: &str = ",.?!:;·";

/// Character class matching one optional trailing punctuation mark.
pub fn punctuation_class() -> String {
    format!("[{}]?", regex::escape(PUNCTUATION))
}

/// Split `^[text].` into the bracket body and its trailing punctuation.
pub fn split_trailing_punctuation(pattern: &str) -> (&str, &str) {
    let body_start = pattern.find('[').map(|i| i + 1).unwrap_or(0);
    match pattern.char_indices().last() {
        Some((i, c)) if PUNCTUATION.contains(c) && pattern[..i].ends_with(']') => {
            (&pattern[body_start..i - 1], &pattern[i..])
        }
        _ => {
            let end = pattern.strip_suffix(']').map(str::len).unwrap_or(pattern.len());
            (&pattern[body_start.min(end)..end], "")
        }
    }
}
