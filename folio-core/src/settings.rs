//! Document settings and `$[VARIABLE]` substitution.
//!
//! Settings read from the index part are global; each part renders with its
//! own copy, so a `$` block inside a part only affects the rest of that part.
//! By convention user settings are capitalised (`AUTHOR`, `OUTLINE`,
//! `NUMBERING`); keys prefixed `config:` are reserved for the engine.

use folio_types::{Parts, INDEX_SLUG};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

use crate::bibliography::split_bibliography;
use crate::blocks::BlockList;
use crate::counters::is_counter_label;
use crate::error::ContentProblem;
use crate::geometry::split_to_dictionary;
use crate::text::escape;

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\[([^\]]*)\]").expect("valid variable regex"));

const CONFIG_PREFIX: &str = "config:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Settings with the document defaults: `OUTLINE = 1.a.i.g`, `NUMBERING = 1`.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert("OUTLINE".to_string(), "1.a.i.g".to_string());
        values.insert("NUMBERING".to_string(), "1".to_string());
        Self { values }
    }

    /// No values at all, not even defaults.
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Read every `$` block of the index part into these settings.
    ///
    /// A trailing bibliography region is not part of the index's settings.
    pub fn extract(&mut self, parts: &Parts) {
        if let Some(index) = parts.get(INDEX_SLUG) {
            let (content, _) = split_bibliography(index);
            let blocks = BlockList::parse(content);
            for block in blocks.find_character_blocks("$") {
                self.read_settings_block(&block.content);
            }
        }
    }

    /// `$ KEY = VALUE` lines, with `+` continuation lines.
    pub fn read_settings_block(&mut self, text: &str) {
        self.values.extend(split_to_dictionary(text, '$', '='));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn update(&mut self, values: BTreeMap<String, String>) {
        self.values.extend(values);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Store an engine value under the un-settable `config:` prefix.
    pub fn set_config(&mut self, key: &str, values: &[String]) {
        self.values
            .insert(format!("{}{}", CONFIG_PREFIX, key), values.join(", "));
    }

    pub fn get_config(&self, key: &str) -> Option<&str> {
        self.get(&format!("{}{}", CONFIG_PREFIX, key))
    }

    /// `/<action>/<user>/<document>`.
    pub fn get_base_uri(&self, action: &str) -> String {
        format!(
            "/{}/{}/{}",
            action,
            self.get_config("user").unwrap_or("guest"),
            self.get_config("document").unwrap_or("notebook")
        )
    }

    /// `/<action>/<user>/<document>/<part>`.
    pub fn get_part_uri(&self, action: &str, part: &str) -> String {
        format!("{}/{}", self.get_base_uri(action), part)
    }

    /// Counter labels from `OUTLINE`, e.g. `1.a.i.g`; unknown labels are
    /// skipped.
    pub fn outline_counters(&self) -> Vec<String> {
        self.get("OUTLINE")
            .unwrap_or("1")
            .split('.')
            .map(str::trim)
            .filter(|label| is_counter_label(label))
            .map(String::from)
            .collect()
    }

    /// Substitute `$[KEY]` and `$[KEY++]` markers in rendered HTML.
    ///
    /// Values are escaped. Unknown keys and non-numeric counters are
    /// returned as problems alongside the HTML.
    pub fn replace(&mut self, html: &str) -> (String, Vec<ContentProblem>) {
        let mut problems = Vec::new();
        let out = VARIABLE_RE
            .replace_all(html, |caps: &Captures| {
                let (value, problem) = self.format_value(&caps[1], &caps[0]);
                problems.extend(problem);
                value
            })
            .into_owned();
        (out, problems)
    }

    fn format_value(&mut self, name: &str, pattern: &str) -> (String, Option<ContentProblem>) {
        if let Some(var) = name.strip_suffix("++") {
            return match self.values.get(var) {
                Some(current) if !current.is_empty() && current.chars().all(|c| c.is_ascii_digit()) => {
                    let next = current.parse::<u64>().unwrap_or(0) + 1;
                    self.values.insert(var.to_string(), next.to_string());
                    (next.to_string(), None)
                }
                Some(_) => (
                    format!("<del>$[{}]++</del> (Not a number!)", escape(var)),
                    Some(
                        ContentProblem::new(pattern, format!("Setting {} is not a number.", var))
                            .with_code("settings.not_a_number"),
                    ),
                ),
                None => {
                    self.values.insert(var.to_string(), "1".to_string());
                    ("1".to_string(), None)
                }
            };
        }
        match self.values.get(name) {
            Some(value) => (escape(value), None),
            None => (
                format!("<tt class=\"error\">{}</tt>", escape(name)),
                Some(
                    ContentProblem::new(pattern, format!("Unknown setting: {}", name))
                        .with_code("settings.unknown"),
                ),
            ),
        }
    }
}
