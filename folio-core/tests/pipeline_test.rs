//! Integration tests for the rendering pipeline
//!
//! These drive whole documents through `render` and check the properties
//! that hold across passes.

use std::collections::BTreeSet;

use folio_core::bibliography::Bibliography;
use folio_core::placeholders::Placeholders;
use folio_core::{
    canonicalize_part, default_counters, render, slugify, EngineConfig, Outline, Parts,
    RenderOptions, Wiki,
};

fn parts(entries: &[(&str, &str)]) -> Parts {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn render_default(doc: &Parts) -> String {
    render(doc, RenderOptions::default(), &EngineConfig::default()).unwrap()
}

#[test]
fn test_slug_determinism() {
    assert_eq!(slugify("It's a test"), "its-a-test");
    assert_eq!(slugify("It's a test"), slugify("It's a test"));
}

#[test]
fn test_canonical_idempotence() {
    let samples = [
        "Title\n\n\n\nA   paragraph\nover lines.",
        "Title\n\n> Quote  one\n> quote two\n\n* item\n* item two",
        "Title\n\n$ AUTHOR = A\n+ continued\n\nDEMO ---\n*[as]   is\n---",
        "Title\n\nBody^[x].\n\n^ Note.\n\n_____\n\nSmith. 2000. Book.",
    ];
    for text in samples {
        let once = canonicalize_part("part", text).unwrap();
        let twice = canonicalize_part("part", &once).unwrap();
        assert_eq!(once, twice, "not idempotent for {:?}", text);
    }
}

#[test]
fn test_placeholder_round_trip() {
    let doc = parts(&[
        ("a", "One ~[Smith], two ~[Jones 2000, p.3]. Plain."),
        ("b", "Nothing to see."),
        ("c", "~[x]~[y]~[z]"),
    ]);
    let mut placeholders = Placeholders::new(r"~\[[^\]]+\]", "cite").unwrap();
    let inserted = placeholders.insert(&doc);
    assert_ne!(inserted["a"], doc["a"]);
    let restored = placeholders
        .replace(&inserted, |pattern, _| pattern.to_string())
        .unwrap();
    assert_eq!(restored, doc);
}

#[test]
fn test_bibliography_labels_are_unique() {
    let doc = parts(&[(
        "biblio",
        "Author. 2000. A.\nAuthor. 2000. B.\nAuthor. 2000. C.\nOther. 2001. D.\nOther. 2001. E.",
    )]);
    let bibliography = Bibliography::new(&doc);
    let labels: BTreeSet<&str> = bibliography
        .entries()
        .iter()
        .map(|e| e.label.as_str())
        .collect();
    assert_eq!(labels.len(), bibliography.entries().len());
}

#[test]
fn test_outline_coverage() {
    let doc = parts(&[
        ("index", "Title\n\n- Alpha\n- Beta\n- - Gamma\n- Missing"),
        ("alpha", "Alpha\n\nText."),
        ("beta", "Beta\n\nText."),
        ("gamma", "Gamma\n\nText."),
    ]);
    let outline = Outline::new(&doc, &default_counters());
    for slug in ["index", "alpha", "beta", "gamma", "missing"] {
        let numbering = outline
            .find_numbering(slug)
            .unwrap_or_else(|| panic!("{} not outlined", slug));
        assert_eq!(outline.find_slug(numbering), Some(slug));
    }
    assert_eq!(outline.find_numbering("gamma").unwrap().dotted(), "2.a");
}

#[test]
fn test_word_count_monotonicity() {
    let mut doc = parts(&[
        ("index", "Title\n\n- Alpha"),
        ("alpha", "Alpha\n\nA few words here."),
    ]);
    let before = Outline::new(&doc, &default_counters()).total_word_count();
    doc.get_mut("alpha")
        .unwrap()
        .push_str("\n\nAnd a few more words.");
    let after = Outline::new(&doc, &default_counters()).total_word_count();
    assert!(after > before);
}

#[test]
fn test_minimal_document() {
    let doc = parts(&[
        ("index", "Title\n\n= Summary\n\n$ AUTHOR = A\n\n- Part One\n"),
        ("part-one", "Part One\n\nHello."),
    ]);
    let mut wiki = Wiki::new(EngineConfig::default());
    let html = wiki.process(&doc, RenderOptions::default()).unwrap();
    assert!(html.contains("<h1 class=\"balance-text\">Title</h1>"));
    assert!(html.contains("<section class=\"body depth-1\">"));
    assert!(html.contains("id=\"1_part-one\""));
    let element = wiki
        .outline()
        .iter()
        .find(|e| e.slug == "part-one")
        .unwrap();
    assert_eq!(element.numbering.dotted(), "1");
    assert!(element.word_count >= 1);
}

#[test]
fn test_smart_typography() {
    let doc = parts(&[("a", "A\n\nIt's 1--5 --- yes...")]);
    let html = render_default(&doc);
    assert!(html.contains("It’s 1&ndash;5 &mdash; yes&hellip;"));
}

#[test]
fn test_bibliography_disambiguation() {
    let doc = parts(&[
        ("index", "Title\n\n- Body"),
        ("body", "Body\n\nAs shown ~[Author 2000, p.3]."),
        ("biblio", "Author. 2000. X.\nAuthor. 2000. Y."),
    ]);
    let html = render_default(&doc);
    assert!(html.contains("2000a. X."));
    assert!(html.contains("2000b. Y."));
    assert!(html.contains("id=\"author-2000a_1_a\""));
    assert!(!html.contains("wr-error"));
}

#[test]
fn test_cross_references() {
    let doc = parts(&[
        ("index", "Title\n\n- The Simple Test\n- The More Complex Test\n- - Inner"),
        ("the-simple-test", "The Simple Test\n\nSee @[-more complex]."),
        ("the-more-complex-test", "The More Complex Test\n\nSee @[simple]."),
        ("inner", "Inner\n\nBack to @[-inner]."),
    ]);
    let html = render_default(&doc);
    assert!(html.contains("href=\"#1_the-simple-test\"><i>The Simple Test</i> (&sect;1)</a>."));
    assert!(html.contains("href=\"#2_the-more-complex-test\">&sect;2</a>."));
    assert!(html.contains("href=\"#2.a_inner\">&sect;2.a</a>."));
}

#[test]
fn test_footnote_balance() {
    let doc = parts(&[(
        "a",
        "A\n\nOne^[x], two^[y] and three^[z].\n\n^ First.\n^ Second.\n^ Third.",
    )]);
    let mut wiki = Wiki::new(EngineConfig::default());
    let html = wiki.process(&doc, RenderOptions::default()).unwrap();
    let positions: Vec<usize> = (1..=3)
        .map(|n| html.find(&format!("<sup>{}</sup>", n)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    for n in 1..=3 {
        assert_eq!(html.matches(&format!("id=\"link_1_{}\"", n)).count(), 1);
        assert_eq!(html.matches(&format!("id=\"footnote_1_{}\"", n)).count(), 1);
    }
    assert!(wiki.outline().errors().is_empty());
}

#[test]
fn test_ibid_reuses_label() {
    let doc = parts(&[
        ("a", "A\n\nFirst ~[Smith]. Again ~[ibid]."),
        ("biblio", "Smith, J. 1999. Book."),
    ]);
    let html = render_default(&doc);
    assert!(html.contains("id=\"smith-j-1999_1_a\""));
    assert!(html.contains("id=\"smith-j-1999_1_b\""));
    assert!(!html.contains("wr-error"));
}

#[test]
fn test_ibid_follows_outline_order() {
    let doc = parts(&[
        ("index", "Title\n\n- Zeta\n- Alpha"),
        ("zeta", "Zeta\n\nSee ~[Smith]."),
        ("alpha", "Alpha\n\nAgain ~[ibid]."),
        ("biblio", "Smith, J. 1999. Book."),
    ]);
    let mut wiki = Wiki::new(EngineConfig::default());
    let html = wiki.process(&doc, RenderOptions::default()).unwrap();
    let first = html.find("id=\"smith-j-1999_1_a\"").unwrap();
    let second = html.find("id=\"smith-j-1999_2_a\"").unwrap();
    assert!(first < second);
    assert!(html.contains("(ibid).<sup>a</sup>"));
    assert!(!html.contains("wr-error"));
    assert!(wiki.outline().errors().is_empty());
}

#[test]
fn test_rerender_is_deterministic() {
    let doc = parts(&[
        ("index", "Title\n\n- Counted"),
        (
            "counted",
            "Counted\n\n$ N = 1\n\nSteps $[N++] and $[N++].\n\nDEMO ---\n/[Hi] there\n---",
        ),
    ]);
    let first = Wiki::new(EngineConfig::default())
        .process(&doc, RenderOptions::default())
        .unwrap();
    let second = Wiki::new(EngineConfig::default())
        .process(&doc, RenderOptions::default())
        .unwrap();
    assert_eq!(first, second);
    assert!(first.contains("Steps 1 and 2."));
    assert!(first.contains("<em>Hi</em>"));

    let mut wiki = Wiki::new(EngineConfig::default());
    let once = wiki.process(&doc, RenderOptions::default()).unwrap();
    let again = wiki.process(&doc, RenderOptions::default()).unwrap();
    assert_eq!(once, again);
    assert_eq!(once, first);
}

#[test]
fn test_metadata_serializes() {
    let doc = parts(&[
        ("index", "My Paper\n\n= About things\n\n$ AUTHOR = Ann\n\n- One"),
        ("one", "One\n\nSome words."),
    ]);
    let mut config = EngineConfig::default();
    config.user = "ann".to_string();
    let mut wiki = Wiki::new(config);
    wiki.process(&doc, RenderOptions::default()).unwrap();
    let metadata = serde_json::to_value(wiki.compile_metadata(None)).unwrap();
    assert_eq!(metadata["title"], "My Paper");
    assert_eq!(metadata["summary"], "About things");
    assert_eq!(metadata["url"], "/read/ann/my-paper");
    assert!(metadata["date_utc"].is_string());
}

#[test]
fn test_fragment_snapshot() {
    let doc = parts(&[("note", "Note\n\nSome /[fine] text.")]);
    let options = RenderOptions {
        fragment: true,
        preview: false,
    };
    let html = render(&doc, options, &EngineConfig::default()).unwrap();
    insta::assert_snapshot!(html, @r###"
    <article>
    <section class="body depth-1">
    <p>Note</p>

    <p>Some <em>fine</em> text.</p>
    </section>
    <footer>
    </footer>
    </article>
    "###);
}
