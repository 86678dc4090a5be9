//! Line-prefixed blocks: headings, notes, quotes, lists, tables, glosses.

use crate::error::ContentProblem;
use crate::functions::generate_table;
use crate::geometry::{split_to_array, split_to_recursive_array, Nested};
use crate::grammar::{self, CAPTION};
use crate::inline;
use crate::settings::Settings;
use crate::text::one_line;

use super::{prefixed_lines, substitute};

/// A block whose lines open with a control character and a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterBlock {
    pub control: char,
    /// Full source text, control character included.
    pub content: String,
}

impl CharacterBlock {
    pub fn new(text: &str) -> Self {
        Self {
            control: text.chars().next().unwrap_or(' '),
            content: text.to_string(),
        }
    }

    /// The first line without its `c ` prefix.
    pub fn body(&self) -> &str {
        let rest = &self.content[self.control.len_utf8()..];
        rest.strip_prefix(' ').unwrap_or(rest)
    }

    /// One `c text` line per prefixed line; subheadings get a blank line
    /// above.
    pub fn text(&self) -> String {
        let lines: Vec<String> = split_to_array(&self.content, &grammar::all_control_chars())
            .into_iter()
            .enumerate()
            .map(|(i, (c, line))| {
                let line = format!("{} {}", c, one_line(&line));
                if i == 0 {
                    line
                } else {
                    line.trim_end().to_string()
                }
            })
            .collect();
        let space_above = if grammar::HEADERS.contains(self.control) {
            "\n"
        } else {
            ""
        };
        format!("{}{}", space_above, lines.join("\n"))
    }

    /// The parser only opens blocks on known controls; a block built by hand
    /// with any other character renders an alert.
    pub fn html(&self, settings: &mut Settings, problems: &mut Vec<ContentProblem>) -> String {
        let c = self.control;
        let content = self.content.as_str();
        let html = if grammar::NULLS.contains(c) {
            return String::new();
        } else if grammar::SETTERS.contains(c) {
            settings.read_settings_block(content);
            return String::new();
        } else if grammar::HEADERS.contains(c) {
            subhead_block(content)
        } else if grammar::QUOTES.contains(c) {
            quote_block(content)
        } else if grammar::NOTES.contains(c) {
            note_block(content)
        } else if c == CAPTION {
            caption_block(content)
        } else if grammar::ALIGNS.contains(c) {
            align_block(content)
        } else if grammar::LISTS.contains(c) {
            list_block(content, settings)
        } else if grammar::TABLES.contains(c) {
            table_block(content)
        } else if grammar::QUIZZES.contains(c) {
            quiz_block(content)
        } else if grammar::GLOSSES.contains(c) {
            gloss_block(content)
        } else {
            problems.push(
                ContentProblem::new(c.to_string(), format!("Unrecognized control character: {}", c))
                    .with_code("block.unknown_control"),
            );
            alert(&format!("Unrecognized control character: {}", c))
        };
        substitute(&html, settings, problems)
    }
}

/// `<name class="...">inline(text)</name>`; empty text keeps its height.
pub(crate) fn tag(name: &str, text: &str, class_name: Option<&str>) -> String {
    let inner = if text.is_empty() {
        "&nbsp;".to_string()
    } else {
        inline::process(text)
    };
    match class_name {
        Some(class_name) if !class_name.is_empty() => {
            format!("<{n} class=\"{c}\">{i}</{n}>", n = name, c = class_name, i = inner)
        }
        _ => format!("<{n}>{i}</{n}>", n = name, i = inner),
    }
}

pub(crate) fn alert(message: &str) -> String {
    format!(
        "<div class=\"alert alert-warning\" role=\"alert\">{}</div>",
        inline::process(message)
    )
}

fn subhead_block(content: &str) -> String {
    prefixed_lines(content, grammar::HEADERS)
        .iter()
        .map(|(_, line)| tag("p", line, Some("subhead")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_block(content: &str) -> String {
    prefixed_lines(content, ">=")
        .iter()
        .map(|(c, line)| match c {
            '>' => tag("blockquote", line, None),
            _ => tag("p", line, Some("caption")),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn note_block(content: &str) -> String {
    prefixed_lines(content, grammar::NOTES)
        .iter()
        .map(|(c, line)| match c {
            '"' => tag("p", line, Some("note")),
            _ => tag("aside", line, Some("note")),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn caption_block(content: &str) -> String {
    prefixed_lines(content, "=")
        .iter()
        .map(|(_, line)| tag("p", line, Some("caption")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn align_class(c: char) -> &'static str {
    match c {
        '.' => "text-left",
        ';' => "text-center",
        ',' => "text-right",
        ':' => "indent",
        '~' => "indent-hanging",
        '{' => "float-left",
        '}' => "float-right",
        _ => "",
    }
}

fn align_block(content: &str) -> String {
    let divs: String = prefixed_lines(content, grammar::ALIGNS)
        .iter()
        .map(|(c, line)| tag("div", line, Some(align_class(*c))))
        .collect();
    if divs.is_empty() {
        return String::new();
    }
    format!("<div class=\"wr-align-block space\"><span>{}</span></div>", divs)
}

/// Bullets `*`, numbers `#` and checkboxes `_`, nested by repeating the
/// prefix.
fn list_block(content: &str, settings: &mut Settings) -> String {
    let Some(c) = content.chars().next() else {
        return String::new();
    };
    let items = split_to_recursive_array(content, c);
    list_recursor(c, &items, settings, 1)
}

/// `$ NUMBERING = N` starts the next top-level ordered list at N;
/// `$ NUMBERING = continue` picks up where the last one stopped.
fn list_recursor(c: char, items: &[Nested], settings: &mut Settings, depth: usize) -> String {
    let ordered = c == '#';
    let list_tag = if ordered { "ol" } else { "ul" };
    let mut properties = Vec::new();
    if ordered && depth == 1 {
        let numbering = settings.get_or("NUMBERING", "");
        if !numbering.is_empty() && numbering.chars().all(|d| d.is_ascii_digit()) {
            properties.push(format!("start=\"{}\"", numbering));
            settings.set("CONTINUE", numbering);
            settings.set("NUMBERING", "");
        } else if numbering == "continue" {
            properties.push(format!("start=\"{}\"", settings.get_or("CONTINUE", "1")));
            settings.set("NUMBERING", "");
        } else {
            settings.set("CONTINUE", "1");
        }
    }
    if c == '_' {
        properties.push("class=\"checkboxes\"".to_string());
    }

    let mut display_items: Vec<String> = Vec::new();
    for item in items {
        match item {
            Nested::List(sublist) => {
                if display_items.is_empty() {
                    continue;
                }
                let nested = list_recursor(c, sublist, settings, depth + 1);
                if let Some(last) = display_items.last_mut() {
                    last.push_str(&nested);
                }
            }
            Nested::Item(text) => {
                display_items.push(inline::process(text));
                if ordered && depth == 1 {
                    let next = settings
                        .get("CONTINUE")
                        .and_then(|n| n.parse::<u64>().ok())
                        .unwrap_or(1)
                        + 1;
                    settings.set("CONTINUE", next.to_string());
                }
            }
        }
    }

    let open_tag = if properties.is_empty() {
        format!("<{}>", list_tag)
    } else {
        format!("<{} {}>", list_tag, properties.join(" "))
    };
    let mut lines = vec![open_tag];
    lines.extend(display_items.iter().map(|item| format!("<li>{}</li>", item)));
    lines.push(format!("</{}>", list_tag));
    lines.join("\n")
}

/// `! A ! B` header line, then `1 | 2` rows.
fn table_block(content: &str) -> String {
    let has_headers = content.starts_with('!');
    let mut lines = prefixed_lines(content, grammar::TABLES).into_iter();
    let mut rows = Vec::new();
    if has_headers {
        if let Some((_, header)) = lines.next() {
            rows.push(header.split('!').map(|s| s.trim().to_string()).collect());
        }
    }
    for (_, line) in lines {
        rows.push(line.split(" | ").map(|s| s.trim().to_string()).collect());
    }
    generate_table(rows, "", has_headers)
}

/// `?` questions and `=` answers, as two ordered lists.
fn quiz_block(content: &str) -> String {
    let mut questions = Vec::new();
    let mut answers = Vec::new();
    for (c, line) in prefixed_lines(content, "?=") {
        match c {
            '?' => questions.push(inline::process(&line)),
            _ => answers.push(inline::process(&line)),
        }
    }
    let list = |class_name: &str, items: &[String]| -> String {
        if items.is_empty() {
            return String::new();
        }
        let lis: String = items.iter().map(|i| format!("<li>{}</li>", i)).collect();
        format!("<ol class=\"{}\">{}</ol>", class_name, lis)
    };
    format!(
        "<div class=\"quiz\">{}{}</div>",
        list("questions", &questions),
        list("answers", &answers)
    )
}

/// Interlinear glosses: `/ 1` numbers the next phrase, `/ source / a / b`
/// gives a source and its translations.
fn gloss_block(content: &str) -> String {
    let separator = " / ";
    let mut groups: Vec<String> = Vec::new();
    let mut number: Option<String> = None;
    for (_, line) in prefixed_lines(content, grammar::GLOSSES) {
        let pieces: Vec<&str> = line.split(separator).collect();
        let Some((source, translations)) = pieces.split_first() else {
            continue;
        };
        if translations.is_empty() {
            number = Some(source.to_string());
            continue;
        }
        let mut phrases = String::new();
        if let Some(n) = number.take() {
            phrases.push_str(&phrase(&inline::process(&n), &[]));
        }
        let translations: Vec<String> = translations.iter().map(|t| inline::process(t)).collect();
        phrases.push_str(&phrase(&inline::process(source), &translations));
        groups.push(format!("<div class=\"phrase-group\">{}</div>", phrases));
    }
    format!("<div class=\"gloss\">{}</div>", groups.concat())
}

fn phrase(source: &str, translations: &[String]) -> String {
    let translations: String = translations
        .iter()
        .map(|t| format!("<div class=\"translation\">{}</div>", t))
        .collect();
    format!(
        "<div class=\"phrase\"><div class=\"source\">{}</div>{}</div>",
        source, translations
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> (String, Vec<ContentProblem>) {
        let mut settings = Settings::new();
        let mut problems = Vec::new();
        let html = CharacterBlock::new(text).html(&mut settings, &mut problems);
        (html, problems)
    }

    #[test]
    fn test_unknown_control_is_reported() {
        let (html, problems) = render("§ stray");
        assert!(html.starts_with("<div class=\"alert alert-warning\" role=\"alert\">"));
        assert!(html.contains("Unrecognized control character"));
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].code, "block.unknown_control");
        assert_eq!(problems[0].pattern, "§");
    }

    #[test]
    fn test_text_is_canonical() {
        let block = CharacterBlock::new("*   one\n*  *  two  \n* three");
        assert_eq!(block.text(), "* one\n* * two\n* three");
    }

    #[test]
    fn test_subhead_text_has_space_above() {
        assert_eq!(CharacterBlock::new("@ Heading").text(), "\n@ Heading");
    }

    #[test]
    fn test_nulls_render_nothing() {
        for text in ["% comment", "^ footnote", "- outline"] {
            assert_eq!(render(text).0, "");
        }
    }

    #[test]
    fn test_subhead_and_notes() {
        assert_eq!(render("@ Sub").0, "<p class=\"subhead\">Sub</p>");
        assert_eq!(render("\" Note").0, "<p class=\"note\">Note</p>");
        assert_eq!(render("' Aside").0, "<aside class=\"note\">Aside</aside>");
    }

    #[test]
    fn test_quote_with_caption() {
        assert_eq!(
            render("> To be.\n= Hamlet").0,
            "<blockquote>To be.</blockquote>\n<p class=\"caption\">Hamlet</p>"
        );
    }

    #[test]
    fn test_align_block() {
        assert_eq!(
            render(". Left\n; Center\n} Float").0,
            "<div class=\"wr-align-block space\"><span><div class=\"text-left\">Left</div><div class=\"text-center\">Center</div><div class=\"float-right\">Float</div></span></div>"
        );
    }

    #[test]
    fn test_nested_list() {
        let (html, _) = render("* one\n* * inner\n* two");
        insta::assert_snapshot!(html, @r###"
        <ul>
        <li>one<ul>
        <li>inner</li>
        </ul></li>
        <li>two</li>
        </ul>
        "###);
    }

    #[test]
    fn test_numbered_list_start_and_continue() {
        let mut settings = Settings::new();
        let mut problems = Vec::new();
        let first = CharacterBlock::new("# a\n# b").html(&mut settings, &mut problems);
        assert!(first.starts_with("<ol start=\"1\">"));
        settings.set("NUMBERING", "continue");
        let second = CharacterBlock::new("# c").html(&mut settings, &mut problems);
        assert!(second.starts_with("<ol start=\"3\">"));
        let third = CharacterBlock::new("# d").html(&mut settings, &mut problems);
        assert!(third.starts_with("<ol>"));
    }

    #[test]
    fn test_checkbox_list() {
        assert!(render("_ todo").0.starts_with("<ul class=\"checkboxes\">"));
    }

    #[test]
    fn test_table_block() {
        let (html, _) = render("! Name ! Age\n| Ada | 36");
        assert!(html.contains("<thead>\n<tr>\n<th class=\"text-left\">Name</th>"));
        assert!(html.contains("<td class=\"text-left\">36</td>"));
    }

    #[test]
    fn test_quiz_block() {
        assert_eq!(
            render("? Two plus two?\n= Four").0,
            "<div class=\"quiz\"><ol class=\"questions\"><li>Two plus two?</li></ol><ol class=\"answers\"><li>Four</li></ol></div>"
        );
    }

    #[test]
    fn test_gloss_block() {
        let (html, _) = render("/ 1\n/ Salve / Hello");
        assert_eq!(
            html,
            "<div class=\"gloss\"><div class=\"phrase-group\"><div class=\"phrase\"><div class=\"source\">1</div></div><div class=\"phrase\"><div class=\"source\">Salve</div><div class=\"translation\">Hello</div></div></div></div>"
        );
    }

    #[test]
    fn test_settings_block_updates_settings() {
        let mut settings = Settings::empty();
        let html = CharacterBlock::new("$ NAME = Ada").html(&mut settings, &mut Vec::new());
        assert_eq!(html, "");
        assert_eq!(settings.get("NAME"), Some("Ada"));
    }

    #[test]
    fn test_variables_in_character_blocks() {
        let mut settings = Settings::empty();
        settings.set("WHO", "Ada");
        let html = CharacterBlock::new("@ By $[WHO]").html(&mut settings, &mut Vec::new());
        assert_eq!(html, "<p class=\"subhead\">By Ada</p>");
    }
}
