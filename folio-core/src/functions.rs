//! Function blocks: named wrappers and transforms.
//!
//! ```text
//! CENTER (50%) ---
//! . You are invited
//! ---
//! ```
//!
//! A wrapper's body is parsed as blocks and its rendered HTML is wrapped; a
//! transform turns its raw body into HTML itself.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::blocks::BlockList;
use crate::error::ContentProblem;
use crate::inline;
use crate::settings::Settings;
use crate::text::{clean_text, dimension_option, escape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    Box,
    Center,
    Compact,
    Feature,
    Float,
    Footer,
    Header,
    Indent,
    Left,
    Print,
    Quote,
    Right,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Grid,
    Table,
    Text,
    Verbatim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Wrapper(Wrapper),
    Transform(Transform),
}

static FUNCTIONS: Lazy<BTreeMap<&'static str, FunctionKind>> = Lazy::new(|| {
    use FunctionKind::{Transform as T, Wrapper as W};
    BTreeMap::from([
        ("BOX", W(Wrapper::Box)),
        ("CENTER", W(Wrapper::Center)),
        ("COMPACT", W(Wrapper::Compact)),
        ("FEATURE", W(Wrapper::Feature)),
        ("FLOAT", W(Wrapper::Float)),
        ("FOOTER", W(Wrapper::Footer)),
        ("HEADER", W(Wrapper::Header)),
        ("INDENT", W(Wrapper::Indent)),
        ("LEFT", W(Wrapper::Left)),
        ("PRINT", W(Wrapper::Print)),
        ("QUOTE", W(Wrapper::Quote)),
        ("RIGHT", W(Wrapper::Right)),
        ("WEB", W(Wrapper::Web)),
        ("GRID", T(Transform::Grid)),
        ("TABLE", T(Transform::Table)),
        ("TEXT", T(Transform::Text)),
        ("VERBATIM", T(Transform::Verbatim)),
    ])
});

/// Registered function for an uppercase block name.
pub fn lookup(name: &str) -> Option<FunctionKind> {
    FUNCTIONS.get(name).copied()
}

/// Every registered name, sorted.
pub fn names() -> Vec<&'static str> {
    FUNCTIONS.keys().copied().collect()
}

impl Wrapper {
    /// Wrap already-rendered HTML.
    pub fn wrap(&self, options: &[String], html: &str) -> String {
        let width = dimension_option(options).unwrap_or_else(|| "auto".to_string());
        match self {
            Wrapper::Center => format!(
                "<div style=\"width: {}; margin: auto;\">{}</div>",
                width, html
            ),
            Wrapper::Left => aligned(&width, Some("text-left"), html),
            Wrapper::Right => format!(
                "{}<div class=\"clear\"></div>",
                aligned(&width, Some("pull-right"), html)
            ),
            Wrapper::Indent => aligned(&width, Some("text-indent"), html),
            Wrapper::Float => aligned(&width, Some("float-left"), html),
            Wrapper::Quote => format!("<blockquote>{}</blockquote>", html),
            Wrapper::Compact => {
                let columns = if options.iter().any(|o| o == "2cols") {
                    " columns-x2 column-rule"
                } else if options.iter().any(|o| o == "3cols") {
                    " columns-x3 column-rule"
                } else {
                    ""
                };
                format!("<div class=\"compact{}\">{}</div>", columns, html)
            }
            Wrapper::Feature => classed("wiki-feature", html),
            Wrapper::Box => classed("box-dotted", html),
            Wrapper::Header => classed("wiki-header", html),
            Wrapper::Footer => classed("wiki-footer", html),
            Wrapper::Print => classed("wiki-print", html),
            Wrapper::Web => classed("wiki-web", html),
        }
    }
}

fn aligned(width: &str, class_name: Option<&str>, html: &str) -> String {
    match class_name {
        Some(class_name) => format!(
            "<div style=\"width: {};\" class=\"{}\">{}</div>",
            width, class_name, html
        ),
        None => format!("<div style=\"width: {};\">{}</div>", width, html),
    }
}

fn classed(class_name: &str, html: &str) -> String {
    format!("<div class=\"{}\">{}</div>", class_name, html)
}

impl Transform {
    pub fn html(
        &self,
        options: &[String],
        content: &str,
        settings: &Settings,
        problems: &mut Vec<ContentProblem>,
    ) -> String {
        match self {
            Transform::Text => {
                if options.iter().any(|o| o == "verse") {
                    format!("<pre class=\"verse\">{}</pre>", inline::process(content))
                } else {
                    format!("<pre>{}</pre>", inline::process(content))
                }
            }
            Transform::Verbatim => format!("<pre>{}</pre>", escape(content)),
            Transform::Table => table(options, content),
            Transform::Grid => grid(content, settings, problems),
        }
    }
}

/// CSV rows. The first option made only of `lcr$` sets column alignment;
/// `headers` makes the first row a header.
fn table(options: &[String], content: &str) -> String {
    let alignments = options
        .iter()
        .find(|o| !o.is_empty() && o.chars().all(|c| "lcr$".contains(c)))
        .map(String::as_str)
        .unwrap_or("");
    let headers = options.iter().any(|o| o == "headers");
    let rows = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_csv_line)
        .collect();
    generate_table(rows, alignments, headers)
}

/// Rows split on `===`, cells on `---`; each cell is a block fragment.
fn grid(content: &str, settings: &Settings, problems: &mut Vec<ContentProblem>) -> String {
    let mut out = vec![
        "<table class=\"table table-condensed\">".to_string(),
        "<tbody>".to_string(),
    ];
    for row in content.split("===") {
        out.push("<tr>".to_string());
        for cell in row.split("---") {
            let blocks = BlockList::parse(&clean_text(cell));
            out.push(format!(
                "<td>{}</td>",
                blocks.fragment_html(settings, problems)
            ));
        }
        out.push("</tr>".to_string());
    }
    out.push("</tbody>".to_string());
    out.push("</table>".to_string());
    out.join("\n")
}

/// One CSV record: commas split fields, double quotes protect commas, and
/// `""` inside quotes is a literal quote.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Table HTML from rows of cells.
///
/// `alignments` holds one of `l c r $` per column (default `l`); `$` right
/// aligns and formats the cell as currency.
pub fn generate_table(mut rows: Vec<Vec<String>>, alignments: &str, headers: bool) -> String {
    let alignments: Vec<char> = alignments.chars().collect();
    let align = |i: usize| alignments.get(i).copied().unwrap_or('l');
    let mut out = vec!["<table class=\"table table-condensed\">".to_string()];
    if headers && !rows.is_empty() {
        let header = rows.remove(0);
        out.push("<thead>".to_string());
        out.push("<tr>".to_string());
        for (i, cell) in header.iter().enumerate() {
            let (class_name, html) = cell_formatting(align(i), cell);
            out.push(format!("<th class=\"{}\">{}</th>", class_name, html));
        }
        out.push("</tr>".to_string());
        out.push("</thead>".to_string());
    }
    out.push("<tbody>".to_string());
    for row in &rows {
        out.push("<tr>".to_string());
        for (i, cell) in row.iter().enumerate() {
            let (class_name, html) = cell_formatting(align(i), cell);
            out.push(format!("<td class=\"{}\">{}</td>", class_name, html));
        }
        out.push("</tr>".to_string());
    }
    out.push("</tbody>".to_string());
    out.push("</table>".to_string());
    out.join("\n")
}

fn cell_formatting(align: char, cell: &str) -> (&'static str, String) {
    match align {
        'r' => ("text-right", inline::process(cell)),
        'c' => ("text-center", inline::process(cell)),
        '$' => (
            "text-right",
            cell.trim()
                .parse::<f64>()
                .map(format_currency)
                .unwrap_or_else(|_| escape(cell)),
        ),
        _ => ("text-left", inline::process(cell)),
    }
}

/// `160000` becomes `$160,000.00`.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
