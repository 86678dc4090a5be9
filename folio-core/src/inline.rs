//! Inline markup: combinable bracket markers and typography.
//!
//! ```text
//! *[bold] /[italic] */[bold italic] =[Small Caps] '[sup] ,[sub]
//! ```
//!
//! Everything outside brackets goes through `typography`, which escapes HTML
//! before making any substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::text::html_escape;

static BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*/_`?|;=!.+\-',{}]{1,3}\[").expect("valid bracket regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)(st|nd|rd|th)\b").expect("valid ordinal regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https?)://([\w.:/+?&;=\-#%~]+)").expect("valid url regex")
});
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w.\-]+)@([\w.\-]+\w)").expect("valid email regex"));
static SENTENCE_SPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\S+)([!?.][”’"'\)\]]{0,3}) +(\S)"#).expect("valid sentence spacing regex")
});

/// Quote pairing, applied in order.
static QUOTES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // A possessive may trail a placeholder at the start of a run.
        (r"^'s(\W)", "’s${1}"),
        (r"\('(\S)", "(‘${1}"),
        (r#"\("(\S)"#, "(“${1}"),
        (r"(\S)'", "${1}’"),
        (r"'(\S)", "‘${1}"),
        (r#"(\S)""#, "${1}”"),
        (r#""(\S)"#, "“${1}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid quote regex"),
            replacement,
        )
    })
    .collect()
});

/// Plain string substitutions, applied in order after dashes.
const LITERALS: &[(&str, &str)] = &[
    ("(1/2)", "&frac12;"),
    ("(1/4)", "&frac14;"),
    ("(3/4)", "&frac34;"),
    ("...", "&hellip;"),
    ("(C)", "&copy;"),
    ("(R)", "&reg;"),
    ("(TM)", "&trade;"),
    ("(D)", "&deg;"),
    ("(S)", "&#8239;"),
    ("(2S)", "&#8239;&#8239;"),
    ("(4S)", "&#8239;&#8239;&#8239;&#8239;"),
    ("(EN)", "&#8194;"),
    ("(2EN)", "&#8194;&#8194;"),
    ("(4EN)", "&#8194;&#8194;&#8194;&#8194;"),
    ("(EM)", "&#8195;"),
    ("(2EM)", "&#8195;&#8195;"),
    ("(4EM)", "&#8195;&#8195;&#8195;&#8195;"),
];

/// No sentence space after these.
const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "etc.", "cf.", "vs.", "mr.", "mrs.", "ms.", "dr.", "st.", "p.", "pp.", "no.",
    "vol.", "ed.", "eds.", "al.",
];

const DOUBLE_STOPS: &[(&str, char)] = &[("//", '/'), ("**", '*'), ("__", '_'), ("==", '=')];

/// Format a run of wiki text as inline HTML.
///
/// A block starting with a double stop (`** `, `// `, `__ `, `== `) is
/// formatted as a whole; an interior ` ** ` formats the lead text and
/// separates it from the rest.
pub fn process(text: &str) -> String {
    for (stop, control) in DOUBLE_STOPS {
        let control = control.to_string();
        if let Some(rest) = text.strip_prefix(&format!("{} ", stop)) {
            return brackets(&control, rest);
        }
        if let Some((lead, rest)) = text.split_once(&format!(" {} ", stop)) {
            return format!(
                "{}&nbsp; {}",
                brackets(&control, lead),
                process_brackets(rest.trim_start())
            );
        }
    }
    process_brackets(text)
}

/// Parse `X[...]` markers; the closing bracket is the one that balances.
fn process_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while pos < text.len() {
        let Some(m) = BRACKET_RE.find_at(text, pos) else {
            out.push_str(&typography(&text[pos..]));
            break;
        };
        let Some(close) = closing_bracket(text, m.end()) else {
            out.push_str(&typography(&text[pos..]));
            break;
        };
        if m.start() > pos {
            out.push_str(&typography(&text[pos..m.start()]));
        }
        let control = &text[m.start()..m.end() - 1];
        out.push_str(&brackets(control, &text[m.end()..close]));
        pos = close + 1;
    }
    out
}

/// Byte offset of the `]` balancing an already opened `[`.
fn closing_bracket(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1;
    for (i, c) in text[from..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn tags_for(control: char) -> (&'static str, &'static str) {
    match control {
        '*' => ("<strong>", "</strong>"),
        '/' => ("<em>", "</em>"),
        '_' => ("<u>", "</u>"),
        '`' => ("<tt>", "</tt>"),
        '?' => ("<kbd>", "</kbd>"),
        '|' => ("<mark>", "</mark>"),
        ';' => ("<span class=\"sans-serif\">", "</span>"),
        '=' => ("<span class=\"small-caps\">", "</span>"),
        '!' => ("<span class=\"large\">", "</span>"),
        '.' => ("<small>", "</small>"),
        '+' => ("<ins>", "</ins>"),
        '-' => ("<del>", "</del>"),
        '\'' => ("<sup>", "</sup>"),
        ',' => ("<sub>", "</sub>"),
        '{' => ("<span class=\"float-left\">", "</span>"),
        '}' => ("<span class=\"float-right\">", "</span>"),
        _ => ("", ""),
    }
}

/// Wrap formatted `content` in the tags named by `control`; the leftmost
/// character is the outermost tag.
pub fn brackets(control: &str, content: &str) -> String {
    let mut html = process_brackets(content);
    if control.contains('=') {
        html = wrap_capitals(&html);
    }
    for c in control.chars().rev() {
        let (open, close) = tags_for(c);
        html = format!("{}{}{}", open, html, close);
    }
    html
}

/// Small caps: typography, then capitals wrapped for letter height control.
pub fn small_caps(content: &str) -> String {
    format!(
        "<span class=\"small-caps\">{}</span>",
        wrap_capitals(&typography(content))
    )
}

/// Wrap runs of A-Z in `<span>`, skipping tags and entities.
fn wrap_capitals(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut run = String::new();
    let mut in_tag = false;
    let mut in_entity = false;
    let flush = |run: &mut String, out: &mut String| {
        if !run.is_empty() {
            out.push_str("<span>");
            out.push_str(run);
            out.push_str("</span>");
            run.clear();
        }
    };
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'[') {
            // Variables are substituted later; keep their names intact.
            flush(&mut run, &mut out);
            out.push(c);
            for v in chars.by_ref() {
                out.push(v);
                if v == ']' {
                    break;
                }
            }
            continue;
        }
        if in_tag || in_entity {
            out.push(c);
            if (in_tag && c == '>') || (in_entity && (c == ';' || c.is_whitespace())) {
                in_tag = false;
                in_entity = false;
            }
            continue;
        }
        if c.is_ascii_uppercase() {
            run.push(c);
            continue;
        }
        flush(&mut run, &mut out);
        out.push(c);
        match c {
            '<' => in_tag = true,
            '&' => in_entity = true,
            _ => {}
        }
    }
    flush(&mut run, &mut out);
    out
}

/// Escape HTML, then make every typographical substitution.
pub fn typography(text: &str) -> String {
    let mut html = html_escape(text);
    html = between_digits(&html, '-', "&ndash;");
    html = between_digits(&html, 'x', "&times;");
    html = html.replace("---", "&mdash;").replace("--", "&ndash;");
    for (from, to) in LITERALS {
        html = html.replace(from, to);
    }
    html = ORDINAL_RE
        .replace_all(&html, "${1}<sup>${2}</sup>")
        .into_owned();
    for (re, replacement) in QUOTES.iter() {
        html = re.replace_all(&html, *replacement).into_owned();
    }
    html = html.replace("\\\n", "<br/>\n");
    html = URL_RE
        .replace_all(&html, "<a href=\"${1}://${2}\">${1}://${2}</a>")
        .into_owned();
    html = EMAIL_RE
        .replace_all(&html, "<a href=\"mailto:${1}@${2}\">${1}@${2}</a>")
        .into_owned();
    space_sentences(&html)
}

/// Replace `target` where it sits between two ASCII digits.
fn between_digits(text: &str, target: char, replacement: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let flanked = i > 0
            && i + 1 < chars.len()
            && chars[i - 1].is_ascii_digit()
            && chars[i + 1].is_ascii_digit();
        if c == target && flanked {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}

/// A little extra space after the end of a sentence.
pub fn space_sentences(text: &str) -> String {
    SENTENCE_SPACE_RE
        .replace_all(text, |caps: &Captures| {
            let tail = &caps[1];
            let punctuation = &caps[2];
            let head = &caps[3];
            if punctuation.starts_with('.') && is_abbreviation(tail) {
                format!("{}{} {}", tail, punctuation, head)
            } else {
                format!("{}{}&nbsp; {}", tail, punctuation, head)
            }
        })
        .into_owned()
}

fn is_abbreviation(tail: &str) -> bool {
    let word = tail
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    ABBREVIATIONS.contains(&format!("{}.", word).as_str())
}

/// Render inline markup and remove the tags.
pub fn strip_markup(text: &str) -> String {
    TAG_RE.replace_all(&process(text), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typography_dashes_and_ellipsis() {
        assert_eq!(
            typography("It's 1--5 --- yes..."),
            "It’s 1&ndash;5 &mdash; yes&hellip;"
        );
    }

    #[test]
    fn test_typography_between_digits() {
        assert_eq!(typography("pages 10-12"), "pages 10&ndash;12");
        assert_eq!(typography("a 2x4 board"), "a 2&times;4 board");
        assert_eq!(typography("x-ray"), "x-ray");
    }

    #[test]
    fn test_typography_escapes_html() {
        assert_eq!(typography("<b> & </b>"), "&lt;b&gt; &amp; &lt;/b&gt;");
    }

    #[test]
    fn test_typography_symbols() {
        assert_eq!(typography("(C) 2020 (TM)"), "&copy; 2020 &trade;");
        assert_eq!(typography("(1/2) cup"), "&frac12; cup");
        assert_eq!(typography("a(2S)b"), "a&#8239;&#8239;b");
    }

    #[test]
    fn test_typography_ordinals() {
        assert_eq!(typography("the 1st and 22nd"), "the 1<sup>st</sup> and 22<sup>nd</sup>");
    }

    #[test]
    fn test_smart_quotes() {
        assert_eq!(typography("\"Hello,\" she said."), "“Hello,” she said.");
        assert_eq!(typography("('quoted')"), "(‘quoted’)");
    }

    #[test]
    fn test_autolinks() {
        assert_eq!(
            typography("see https://example.com/x"),
            "see <a href=\"https://example.com/x\">https://example.com/x</a>"
        );
        assert_eq!(
            typography("mail me@example.com"),
            "mail <a href=\"mailto:me@example.com\">me@example.com</a>"
        );
    }

    #[test]
    fn test_sentence_spacing() {
        assert_eq!(typography("One. Two"), "One.&nbsp; Two");
        assert_eq!(typography("Done! (Really.) Next"), "Done!&nbsp; (Really.)&nbsp; Next");
        assert_eq!(typography("See e.g. this"), "See e.g. this");
        assert_eq!(typography("Ask Dr. Who"), "Ask Dr. Who");
    }

    #[test]
    fn test_line_break() {
        assert_eq!(typography("a\\\nb"), "a<br/>\nb");
    }

    #[test]
    fn test_brackets() {
        assert_eq!(process("*[bold] text"), "<strong>bold</strong> text");
        assert_eq!(process("*/[both]"), "<strong><em>both</em></strong>");
        assert_eq!(process("`[a < b]"), "<tt>a &lt; b</tt>");
        assert_eq!(process("x '[2] ,[i]"), "x <sup>2</sup> <sub>i</sub>");
    }

    #[test]
    fn test_nested_brackets_balance() {
        assert_eq!(
            process("*[outer /[inner] end]"),
            "<strong>outer <em>inner</em> end</strong>"
        );
    }

    #[test]
    fn test_unclosed_bracket_is_text() {
        assert_eq!(process("*[open"), "*[open");
    }

    #[test]
    fn test_small_caps() {
        assert_eq!(
            process("=[NASA Rules]"),
            "<span class=\"small-caps\"><span>NASA</span> <span>R</span>ules</span>"
        );
        assert_eq!(
            process("=[Hi $[NAME]]"),
            "<span class=\"small-caps\"><span>H</span>i $[NAME]</span>"
        );
        assert_eq!(
            small_caps("AD"),
            "<span class=\"small-caps\"><span>AD</span></span>"
        );
    }

    #[test]
    fn test_double_stops() {
        assert_eq!(process("** All bold"), "<strong>All bold</strong>");
        assert_eq!(
            process("Lead text. ** The rest."),
            "<strong>Lead text.</strong>&nbsp; The rest."
        );
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("*[Author] /[Title]"), "Author Title");
    }
}
