//! Operations on whole documents and single parts that don't render HTML.

use folio_types::{OutlineElement, Parts, BIBLIO_SLUG};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::bibliography::split_bibliography;
use crate::blocks::{get_title_data, BlockList};
use crate::config::EngineConfig;
use crate::demo::Demo;
use crate::error::{Result, WikiError};
use crate::outline::{iterate_parts, Outline};
use crate::settings::Settings;
use crate::text::clean_text;

static EXPORT_DIVIDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\.{10}  (\S+) (\S+)  \.{10}[ \t]*$").expect("valid export divider regex")
});

/// Number shown in an export divider for parts outside the outline.
const SPARE_NUMBER: &str = "+";

/// Normalise the layout of a part.
///
/// Blocks are re-emitted in canonical form; demo blocks and the
/// bibliography region are kept exactly as written. `biblio` is returned
/// unchanged. Applying this twice gives the same text as applying it once.
pub fn canonicalize_part(slug: &str, text: &str) -> Result<String> {
    if slug == BIBLIO_SLUG {
        return Ok(text.to_string());
    }
    let cleaned = clean_text(text);
    let (content, bibliography) = split_bibliography(&cleaned);

    let mut demo = Demo::new(&Settings::new(), &EngineConfig::default())?;
    let mut parts = Parts::new();
    parts.insert(slug.to_string(), content.to_string());
    let isolated = demo.insert(&parts);

    let mut canonical = Parts::new();
    canonical.insert(
        slug.to_string(),
        BlockList::parse(&isolated[slug]).text(),
    );
    let mut out = demo
        .restore(&canonical)?
        .remove(slug)
        .unwrap_or_default();
    if let Some(bibliography) = bibliography {
        out.push_str("\n\n\n_____\n\n");
        out.push_str(bibliography.trim());
    }
    Ok(out)
}

/// `(part_slug, title, title_slug, summary)`.
pub fn extract_title_data(text: &str, slug: &str) -> (String, String, String, String) {
    get_title_data(text, slug)
}

/// Ordered outline elements for a document.
pub fn outline(parts: &Parts, counters: &[String]) -> Vec<OutlineElement> {
    Outline::new(parts, counters).elements().to_vec()
}

fn divider(number: &str, slug: &str) -> String {
    format!("..........  {} {}  ..........", number, slug)
}

/// One text file holding a whole document: outlined parts in order, then
/// the rest, each after a divider line.
pub fn export_text(parts: &Parts, counters: &[String]) -> String {
    let listed = iterate_parts(parts, counters);
    let mut out = Vec::new();
    for (numbering, _, slug, text) in &listed {
        out.push(divider(&numbering.dotted(), slug));
        out.push(text.trim().to_string());
    }
    for (slug, text) in parts {
        if !listed.iter().any(|(_, _, listed_slug, _)| listed_slug == slug) {
            out.push(divider(SPARE_NUMBER, slug));
            out.push(text.trim().to_string());
        }
    }
    let mut text = out.join("\n\n");
    text.push('\n');
    text
}

/// Split an exported file back into parts.
pub fn import_text(text: &str) -> Result<Parts> {
    let text = text.replace("\r\n", "\n");
    let dividers: Vec<(usize, usize, String)> = EXPORT_DIVIDER_RE
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[2].to_string()))
        })
        .collect();

    let Some((first, _, _)) = dividers.first() else {
        return Err(WikiError::MalformedExport("no part dividers found".to_string()));
    };
    if !text[..*first].trim().is_empty() {
        return Err(WikiError::MalformedExport(
            "text before the first part divider".to_string(),
        ));
    }

    let mut parts = Parts::new();
    for (i, (_, end, slug)) in dividers.iter().enumerate() {
        let next = dividers.get(i + 1).map(|d| d.0).unwrap_or(text.len());
        if parts
            .insert(slug.clone(), text[*end..next].trim().to_string())
            .is_some()
        {
            return Err(WikiError::MalformedExport(format!("part '{}' appears twice", slug)));
        }
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_counters;

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonicalize_part() {
        let text = "Title\r\n\r\n\r\n\r\nSome   text\nhere.\n\n>   quoted  \n\nDEMO ---\n*[keep]   as is\n---\n\n___\n\nSmith. 2000. Book.";
        let once = canonicalize_part("a", text).unwrap();
        assert!(once.starts_with("Title\n\nSome text here.\n\n"));
        assert!(once.contains("DEMO ---\n*[keep]   as is\n---"));
        assert!(once.ends_with("\n\n\n_____\n\nSmith. 2000. Book."));
        assert_eq!(canonicalize_part("a", &once).unwrap(), once);
    }

    #[test]
    fn test_biblio_is_unchanged() {
        let text = "B. 2000.   X.\n\n\nA. 1999. Y.";
        assert_eq!(canonicalize_part("biblio", text).unwrap(), text);
    }

    #[test]
    fn test_outline_order() {
        let doc = parts(&[
            ("index", "Title\n\n- Second Part\n- First Part"),
            ("first-part", "First Part\n\nText."),
            ("second-part", "Second Part\n\nText."),
        ]);
        let slugs: Vec<String> = outline(&doc, &default_counters())
            .into_iter()
            .map(|e| e.slug)
            .collect();
        assert_eq!(slugs, vec!["index", "second-part", "first-part"]);
    }

    #[test]
    fn test_export_and_import() {
        let doc = parts(&[
            ("index", "Title\n\n- Chapter"),
            ("chapter", "Chapter\n\nText."),
            ("notes", "Notes\n\nSpare."),
            ("biblio", "A. 2000. X."),
        ]);
        let exported = export_text(&doc, &default_counters());
        let index = exported.find("..........  0 index  ..........").unwrap();
        let chapter = exported.find("..........  1 chapter  ..........").unwrap();
        let notes = exported.find("..........  + notes  ..........").unwrap();
        assert!(index < chapter && chapter < notes);
        assert!(exported.contains("..........  + biblio  .........."));
        assert_eq!(import_text(&exported).unwrap(), doc);
    }

    #[test]
    fn test_import_rejects_malformed() {
        assert!(matches!(
            import_text("just some text"),
            Err(WikiError::MalformedExport(_))
        ));
        assert!(matches!(
            import_text("preamble\n..........  1 a  ..........\nText"),
            Err(WikiError::MalformedExport(_))
        ));
        assert!(matches!(
            import_text("..........  1 a  ..........\nX\n..........  2 a  ..........\nY"),
            Err(WikiError::MalformedExport(_))
        ));
    }
}
