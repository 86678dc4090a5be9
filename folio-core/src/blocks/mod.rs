//! Turning a part's text into blocks.
//!
//! A `BlockList` parses one part into paragraphs, dividers, character blocks
//! (line-prefixed, like `* bullet`) and function blocks (fenced, like
//! `CENTER (50%) ---`). It can give the text back in canonical form or render
//! it as HTML.

mod character;

use folio_types::{Numbering, INDEX_SLUG};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ContentProblem;
use crate::functions::{self, FunctionKind};
use crate::geometry::{split_to_array, split_to_dictionary};
use crate::grammar::{self, CAPTION};
use crate::inline;
use crate::placeholders::is_placeholder;
use crate::settings::Settings;
use crate::slug::slugify;
use crate::text::{clean_text, one_line, shorten, split_options};

pub use character::CharacterBlock;

/// Titles and summaries are cut to this many characters.
pub const TITLE_WIDTH: usize = 128;

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Z]+)\s+(\([^)]+\)\s)?\s*([-=>+:%"/]{3})\s*\n"#)
        .expect("valid function block regex")
});

/// One unit of a part.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Plain text, whitespace normalized to single spaces.
    Paragraph(String),
    /// A paragraph that is exactly a divider pattern, like `* * *`.
    Divider(String),
    Character(CharacterBlock),
    Function(FunctionBlock),
}

impl Block {
    /// Canonical wiki text for this block.
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(content) | Block::Divider(content) => content.clone(),
            Block::Character(block) => block.text(),
            Block::Function(block) => block.text(),
        }
    }

    /// HTML for this block. Settings blocks update `settings`.
    pub fn html(&self, settings: &mut Settings, problems: &mut Vec<ContentProblem>) -> String {
        match self {
            Block::Paragraph(content) => {
                let html = if is_placeholder(content) {
                    content.clone()
                } else {
                    format!("<p>{}</p>", inline::process(content))
                };
                substitute(&html, settings, problems)
            }
            Block::Divider(content) => divider_html(content),
            Block::Character(block) => block.html(settings, problems),
            Block::Function(block) => block.html(settings, problems),
        }
    }
}

/// Apply `$[VARIABLE]` substitution, collecting any problems.
pub(crate) fn substitute(
    html: &str,
    settings: &mut Settings,
    problems: &mut Vec<ContentProblem>,
) -> String {
    let (out, found) = settings.replace(html);
    problems.extend(found);
    out
}

fn divider_html(content: &str) -> String {
    match content {
        "*" => "<p class=\"text-center text-large space\"><span>✻</span></p>".to_string(),
        "* * *" => {
            "<p class=\"text-center text-large big-space\"><span>✻ ✻ ✻</span></p>".to_string()
        }
        "-" => rule("div-solid div-center"),
        "- - -" => rule("div-solid"),
        ". . ." => rule("div-dotted div-wide"),
        "= = =" => rule("div-thick div-wide"),
        "~" => space(1),
        "~ ~" => space(2),
        "~ ~ ~" => space(3),
        "~ ~ ~ ~" => space(4),
        _ => String::new(),
    }
}

fn rule(class_name: &str) -> String {
    format!("<hr class=\"{}\" />", class_name)
}

fn space(lines: usize) -> String {
    "<p class=\"text-left\">&nbsp;</p>".repeat(lines)
}

/// A named, fenced block:
///
/// ```text
/// CENTER (50%) ---
/// . Centered text
/// ---
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBlock {
    pub name: String,
    pub kind: FunctionKind,
    pub options: Vec<String>,
    pub divider: char,
    pub content: String,
    /// Parsed body, for wrappers only.
    pub blocks: Option<BlockList>,
}

impl FunctionBlock {
    pub fn new(name: &str, kind: FunctionKind, options: Vec<String>, divider: char, content: &str) -> Self {
        let blocks = match kind {
            FunctionKind::Wrapper(_) => Some(BlockList::parse(content)),
            FunctionKind::Transform(_) => None,
        };
        Self {
            name: name.to_string(),
            kind,
            options,
            divider,
            content: content.to_string(),
            blocks,
        }
    }

    /// Fence lines around the body; options in parentheses when present.
    pub fn text(&self) -> String {
        let fence: String = std::iter::repeat(self.divider).take(3).collect();
        let mut lines = vec![if self.options.is_empty() {
            format!("{} {}", self.name, fence)
        } else {
            format!("{} ({}) {}", self.name, self.options.join(", "), fence)
        }];
        let content = match &self.blocks {
            Some(blocks) => blocks.text(),
            None => self.content.clone(),
        };
        if !content.is_empty() {
            lines.push(content);
        }
        lines.push(fence);
        lines.join("\n")
    }

    pub fn html(&self, settings: &mut Settings, problems: &mut Vec<ContentProblem>) -> String {
        match (&self.kind, &self.blocks) {
            (FunctionKind::Wrapper(wrapper), Some(blocks)) => {
                let inner = blocks.fragment_html(settings, problems);
                wrapper.wrap(&self.options, &inner)
            }
            (FunctionKind::Wrapper(wrapper), None) => wrapper.wrap(&self.options, ""),
            (FunctionKind::Transform(transform), _) => {
                transform.html(&self.options, &self.content, settings, problems)
            }
        }
    }
}

/// Where a block list is being rendered.
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    pub numbering: &'a Numbering,
    pub slug: &'a str,
    /// No heading at all (demo output, wrapped content).
    pub fragment: bool,
    /// A heading without its section number (editor preview).
    pub preview: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    /// Split text into blocks, in source order.
    pub fn parse(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut cursor = 0;
        while cursor < text.len() {
            cursor = start_of_block(text, cursor);
            if cursor >= text.len() {
                break;
            }

            if let Some((block, next)) = match_function_block(text, cursor) {
                blocks.push(Block::Function(block));
                cursor = next;
                continue;
            }

            let rest = &text[cursor..];
            let chunk = match rest.find("\n\n") {
                Some(offset) => {
                    cursor += offset;
                    rest[..offset].trim()
                }
                None => {
                    cursor = text.len();
                    rest.trim()
                }
            };
            if chunk.is_empty() {
                continue;
            }
            let mut chars = chunk.chars();
            let (first, second) = (chars.next(), chars.next());
            if grammar::is_divider(chunk) {
                blocks.push(Block::Divider(chunk.to_string()));
            } else if matches!((first, second), (Some(c), Some(' ')) if grammar::is_control_char(c)) {
                blocks.push(Block::Character(CharacterBlock::new(chunk)));
            } else {
                blocks.push(Block::Paragraph(one_line(chunk)));
            }
        }
        Self { blocks }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Character blocks whose control character is one of `chars`.
    pub fn find_character_blocks(&self, chars: &str) -> Vec<&CharacterBlock> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Character(c) if chars.contains(c.control) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Canonical text: blocks separated by one blank line.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Title from a leading paragraph (or `%` comment), summary from a
    /// caption right after it. Both are cut to `TITLE_WIDTH`.
    pub fn title_and_summary(&self) -> (String, String) {
        let title = match self.blocks.first() {
            Some(Block::Paragraph(content)) => shorten(content, TITLE_WIDTH),
            Some(Block::Character(block)) if block.control == '%' => {
                shorten(block.body(), TITLE_WIDTH)
            }
            _ => String::new(),
        };
        let summary = match self.blocks.get(1) {
            Some(Block::Character(block)) if block.control == CAPTION => {
                shorten(block.body(), TITLE_WIDTH)
            }
            _ => String::new(),
        };
        (title, summary)
    }

    /// Like `title_and_summary`, removing the blocks they came from.
    pub fn pop_titles(&mut self) -> (String, String) {
        let mut title = String::new();
        let mut summary = String::new();
        match self.blocks.first() {
            Some(Block::Paragraph(content)) => {
                title = content.clone();
                self.blocks.remove(0);
            }
            Some(Block::Character(block)) if block.control == '%' => {
                title = block.body().to_string();
                self.blocks.remove(0);
            }
            _ => {}
        }
        if let Some(Block::Character(block)) = self.blocks.first() {
            if block.control == CAPTION {
                summary = block.body().to_string();
                self.blocks.remove(0);
            }
        }
        (shorten(&title, TITLE_WIDTH), shorten(&summary, TITLE_WIDTH))
    }

    /// Render a section: a numbered heading from the popped title, then
    /// every block. Settings changes stay local to this call.
    pub fn html(
        &self,
        section: SectionContext<'_>,
        settings: &Settings,
        problems: &mut Vec<ContentProblem>,
    ) -> String {
        let mut local = settings.clone();
        let mut out = Vec::new();
        let mut blocks = self.clone();
        if !section.fragment && section.slug != INDEX_SLUG {
            let (title, summary) = blocks.pop_titles();
            let number = (!section.preview).then(|| section.numbering.dotted());
            let subtitle = (!summary.is_empty()).then(|| inline::process(&summary));
            let heading = section_heading(
                &anchor_name(section.numbering, section.slug),
                number.as_deref(),
                &inline::process(&title),
                subtitle.as_deref(),
                section.numbering.depth(),
            );
            out.push(substitute(&heading, &mut local, problems));
        }
        for block in blocks.iter() {
            let html = block.html(&mut local, problems);
            if !html.is_empty() {
                out.push(html);
            }
        }
        out.join("\n\n")
    }

    /// Render without any heading, sharing the caller's settings.
    pub fn fragment_html(&self, settings: &Settings, problems: &mut Vec<ContentProblem>) -> String {
        let numbering = Numbering::index();
        let section = SectionContext {
            numbering: &numbering,
            slug: "fragment",
            fragment: true,
            preview: false,
        };
        self.html(section, settings, problems)
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// The next block starts at a non-blank character after a blank line.
fn start_of_block(text: &str, cursor: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = cursor.min(bytes.len());
    while i < bytes.len() {
        let after_blank_line =
            i == 0 || (i == 1 && bytes[0] == b'\n') || (i >= 2 && &bytes[i - 2..i] == b"\n\n");
        if after_blank_line && bytes[i] != b' ' && bytes[i] != b'\n' {
            return i;
        }
        i += 1;
    }
    i
}

/// `NAME (options) DDD` ... `DDD`, when NAME is a registered function.
fn match_function_block(text: &str, cursor: usize) -> Option<(FunctionBlock, usize)> {
    let rest = &text[cursor..];
    let caps = FUNCTION_RE.captures(rest)?;
    let name = caps.get(1)?.as_str();
    let fence = caps.get(3)?.as_str();
    let mut fence_chars = fence.chars();
    let divider = fence_chars.next()?;
    if !fence_chars.all(|c| c == divider) {
        return None;
    }
    let kind = functions::lookup(name)?;

    let end = rest
        .find(&format!("\n{}\n", fence))
        .or_else(|| rest.find(&format!("\n{}", fence)))?;
    let next = (cursor + end + 5).min(text.len());
    let block_text = text[cursor..next].trim();
    let lines: Vec<&str> = block_text.lines().collect();
    let content = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        String::new()
    };
    let options = caps
        .get(2)
        .map(|m| split_options(m.as_str()))
        .unwrap_or_default();
    Some((
        FunctionBlock::new(name, kind, options, divider, &content),
        next,
    ))
}

/// Anchor id of a section heading: `<dotted-numbering>_<slug>`.
pub fn anchor_name(numbering: &Numbering, slug: &str) -> String {
    format!("{}_{}", numbering.dotted(), slug)
}

/// Heading for a body section; depth selects `h1`..`h6`.
pub fn section_heading(
    nav_id: &str,
    number: Option<&str>,
    title_html: &str,
    subtitle_html: Option<&str>,
    depth: usize,
) -> String {
    let level = depth.clamp(1, 6);
    let prefix = match number {
        Some(number) => format!("{}. &nbsp; ", number),
        None => String::new(),
    };
    let mut html = format!(
        "<h{level} id=\"{nav}\" class=\"balance-text\"><a class=\"unmarked\" href=\"#{nav}\">{prefix}{title}</a></h{level}>",
        level = level,
        nav = nav_id,
        prefix = prefix,
        title = title_html,
    );
    if let Some(subtitle) = subtitle_html {
        html.push_str(&format!("\n<p class=\"summary balance-text\">{}</p>", subtitle));
    }
    html
}

/// `(part_slug, title, title_slug, summary)` for a part, honouring a
/// `$ SLUG = ...` setting.
pub fn get_title_data(text: &str, part_slug: &str) -> (String, String, String, String) {
    let blocks = BlockList::parse(&clean_text(text));
    let (title, summary) = blocks.title_and_summary();
    let mut title_slug = slugify(&title);
    for block in blocks.find_character_blocks("$") {
        let values = split_to_dictionary(&block.text(), '$', '=');
        if let Some(slug) = values.get("SLUG") {
            title_slug = slugify(slug);
        }
    }
    (part_slug.to_string(), title, title_slug, summary)
}

/// Lines of a character block with their prefixes, for renderers.
pub(crate) fn prefixed_lines(content: &str, prefixes: &str) -> Vec<(char, String)> {
    split_to_array(content, prefixes)
}
