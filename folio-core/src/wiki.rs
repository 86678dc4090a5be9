//! The render pipeline: a document's parts in, one `<article>` out.

use folio_types::{Metadata, Numbering, Parts, BIBLIO_SLUG, INDEX_SLUG};
use tracing::debug;

use crate::bibliography::{split_bibliography, Bibliography, Citations};
use crate::blocks::{get_title_data, BlockList, SectionContext};
use crate::config::EngineConfig;
use crate::cross_references::CrossReferences;
use crate::demo::Demo;
use crate::error::{ContentProblem, Result, WikiError};
use crate::footnotes::{Footnotes, Links};
use crate::index::{Index, Tags};
use crate::inline;
use crate::isolate::Isolator;
use crate::metadata::{author_cols, compile_metadata, split_author, today_in};
use crate::outline::Outline;
use crate::settings::Settings;
use crate::text::{clean_document, escape, CleanDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// A single part with no heading and no edit button.
    pub fragment: bool,
    /// Headings without section numbers.
    pub preview: bool,
}

/// Renders documents. Settings read from a document's index stay on the
/// `Wiki` afterwards, for `compile_metadata`.
#[derive(Debug, Clone)]
pub struct Wiki {
    config: EngineConfig,
    settings: Settings,
    outline: Outline,
}

impl Wiki {
    pub fn new(config: EngineConfig) -> Self {
        let mut settings = Settings::new();
        settings.set("OUTLINE", config.counters.join("."));
        settings.set_config("user", &[config.user.clone()]);
        settings.set_config("document", &[config.document.clone()]);
        Self::with_settings(config, settings)
    }

    pub fn with_settings(config: EngineConfig, settings: Settings) -> Self {
        Self {
            config,
            settings,
            outline: Outline::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Outline of the last render, with its content problems.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Metadata of the last render.
    pub fn compile_metadata(&self, doc_slug: Option<&str>) -> Metadata {
        compile_metadata(
            &self.settings,
            &self.outline,
            &self.config,
            doc_slug,
            today_in(&self.config.timezone),
        )
    }

    /// Render a document.
    ///
    /// - With an `index` part the result has a header, a table of contents
    ///   and numbered sections.
    /// - Without one, parts are numbered in slug order.
    /// - A fragment is one part with no heading, as used by `DEMO` output.
    pub fn process(&mut self, parts: &Parts, options: RenderOptions) -> Result<String> {
        validate_document(parts, options.fragment, self.config.max_parts)?;
        let CleanDocument { parts, files } = clean_document(parts);
        debug!(
            parts = parts.len(),
            fragment = options.fragment,
            preview = options.preview,
            "rendering document"
        );

        let mut demo = Demo::new(&self.settings, &self.config)?;
        let mut verbatim = Isolator::verbatim()?;
        let mut backslashes = Isolator::backslashes()?;
        let mut entities = Isolator::entities()?;

        let parts = demo.insert(&parts);
        let outline_source = parts.clone();
        let parts = verbatim.insert(&parts);
        let parts = backslashes.insert(&parts);
        let parts = entities.insert(&parts);

        self.settings.extract(&parts);
        self.settings.set_config("files", &files);

        let mut outline = Outline::new(&outline_source, &self.settings.outline_counters());
        let mut cross_references = CrossReferences::new()?;
        let mut footnotes = Footnotes::new(&parts, &mut outline);
        let mut links = Links::new()?;
        let mut index = Index::new();
        let mut tags = Tags::new()?;
        let mut bibliography = Bibliography::new(&parts);
        let mut citations = Citations::new()?;

        let parts = cross_references.insert(&parts);
        let parts = links.insert(&parts);
        let parts = tags.insert(&parts);
        let parts = citations.insert(&parts);

        let mut html_parts = Parts::new();
        if let Some(text) = parts.get(INDEX_SLUG) {
            let (_, title, _, summary) = get_title_data(text, INDEX_SLUG);
            self.settings.set("TITLE", title);
            self.settings.set("SUMMARY", summary);
            let mut html = self.make_index(text, &mut outline);
            if !outline.single_page() {
                let edit_base_uri = self.settings.get_base_uri("edit");
                html.push('\n');
                html.push_str(&outline.html(&edit_base_uri));
                let spare = outline.html_spare_parts(&parts, &edit_base_uri);
                if !spare.is_empty() {
                    html.push('\n');
                    html.push_str(&spare);
                }
            }
            html_parts.insert(INDEX_SLUG.to_string(), html);
        } else {
            self.settings.set("TITLE", "");
        }

        let sections = body_sections(&outline, &parts);
        for (numbering, slug) in &sections {
            let html = self.make_section(numbering, slug, &parts[slug], options, &mut outline);
            html_parts.insert(slug.clone(), html);
        }

        let html_parts = citations.replace(&html_parts, &mut bibliography, &mut outline)?;
        let html_parts = tags.replace(&html_parts, &mut index, &outline)?;
        let html_parts = links.replace(&html_parts, &mut footnotes, &outline)?;
        let html_parts = cross_references.replace(&html_parts, &mut outline)?;

        let html_parts = demo.replace(&html_parts)?;
        let html_parts = verbatim.replace(&html_parts)?;
        let html_parts = backslashes.replace(&html_parts)?;
        let html_parts = entities.replace(&html_parts)?;

        let restore = |slug: &str, html: &str| -> Result<String> {
            let html = verbatim.replace_text(slug, html)?;
            let html = backslashes.replace_text(slug, &html)?;
            entities.replace_text(slug, &html)
        };
        let single_page = outline.single_page();
        let endmatter: Vec<String> = [
            footnotes.html(&restore)?,
            bibliography.html(single_page, &restore)?,
            index.html(single_page, &restore)?,
        ]
        .into_iter()
        .filter(|html| !html.trim().is_empty())
        .collect();

        let mut out = vec!["<article>".to_string()];
        if let Some(html) = html_parts.get(INDEX_SLUG) {
            out.push(html.clone());
        }
        for (_, slug) in &sections {
            if let Some(html) = html_parts.get(slug) {
                out.push(html.clone());
            }
        }
        out.push(make_footer(&endmatter));
        out.push("</article>".to_string());

        debug!(
            sections = sections.len(),
            problems = outline.errors().values().map(Vec::len).sum::<usize>(),
            "rendered document"
        );
        self.outline = outline;
        Ok(out.join("\n"))
    }

    /// Front matter (title, summary, authors, date) and the index body.
    fn make_index(&self, text: &str, outline: &mut Outline) -> String {
        let (content, _) = split_bibliography(text);
        let mut blocks = BlockList::parse(content);
        let (title, summary) = blocks.pop_titles();
        let mut problems = Vec::new();
        let content_html = blocks.fragment_html(&self.settings, &mut problems);
        record_all(outline, INDEX_SLUG, problems);

        let mut out = vec!["<header>".to_string()];
        if !title.is_empty() {
            out.push("<hgroup>".to_string());
            out.push(format!(
                "<h1 class=\"balance-text\">{}</h1>",
                inline::process(&title)
            ));
            if !summary.is_empty() {
                out.push(format!(
                    "<summary class=\"balance-text\">{}</summary>",
                    inline::process(&summary)
                ));
            }
            out.push("</hgroup>".to_string());
        }

        let authors = split_author(self.settings.get("AUTHOR").unwrap_or(""));
        if !authors.is_empty() {
            let cols = author_cols(authors.len());
            out.push("<div class=\"author-list\">".to_string());
            for author in authors.iter().filter(|lines| !lines.is_empty()) {
                out.push(format!("<address class=\"col-xs-{}\">", cols));
                for line in author {
                    out.push(format!("<div>{}</div>", inline::process(line)));
                }
                out.push("</address>".to_string());
            }
            out.push("</div>".to_string());
        }

        if let Some(date) = self.settings.get("DATE").filter(|d| !d.trim().is_empty()) {
            out.push(format!(
                "<p class=\"space\" rel=\"date\"><time pubdate datetime=\"{}\">{}</time></p>",
                escape(date.trim()),
                inline::process(date.trim())
            ));
        }
        out.push("</header>".to_string());
        out.push("<section>".to_string());
        out.push(content_html);
        out.push("</section>".to_string());
        out.join("\n")
    }

    /// A body part in its section, with an edit button unless a fragment.
    fn make_section(
        &self,
        numbering: &Numbering,
        slug: &str,
        text: &str,
        options: RenderOptions,
        outline: &mut Outline,
    ) -> String {
        let (content, _) = split_bibliography(text);
        let blocks = BlockList::parse(content);
        let section = SectionContext {
            numbering,
            slug,
            fragment: options.fragment,
            preview: options.preview,
        };
        let mut problems = Vec::new();
        let content_html = blocks.html(section, &self.settings, &mut problems);
        record_all(outline, slug, problems);

        let mut out = vec![format!("<section class=\"body depth-{}\">", numbering.depth())];
        if !options.fragment {
            out.push(format!(
                "<div class=\"pull-right no-print no-preview\"><button class=\"button-edge\" onclick=\"location.href='{}';\"><i class=\"fa fa-pencil\"></i> Edit</button></div>",
                self.settings.get_part_uri("edit", slug)
            ));
        }
        out.push(content_html);
        out.push("</section>".to_string());
        out.join("\n")
    }
}

/// Outline elements with a part to render, in outline order.
fn body_sections(outline: &Outline, parts: &Parts) -> Vec<(Numbering, String)> {
    outline
        .iter()
        .filter(|e| parts.contains_key(&e.slug) && e.slug != INDEX_SLUG && e.slug != BIBLIO_SLUG)
        .map(|e| (e.numbering.clone(), e.slug.clone()))
        .collect()
}

fn record_all(outline: &mut Outline, slug: &str, problems: Vec<ContentProblem>) {
    for problem in problems {
        outline.record(slug, problem);
    }
}

fn make_footer(endmatter: &[String]) -> String {
    let mut out = vec!["<footer>".to_string()];
    if !endmatter.is_empty() {
        out.push("<hr class=\"div-left div-solid\"/>".to_string());
        out.extend(endmatter.iter().cloned());
    }
    out.push("</footer>".to_string());
    out.join("\n")
}

/// 1 to `max_parts` parts; a fragment has exactly one.
pub fn validate_document(parts: &Parts, fragment: bool, max_parts: usize) -> Result<()> {
    match parts.len() {
        0 => Err(WikiError::EmptyDocument),
        found if found > max_parts => Err(WikiError::TooManyParts {
            max: max_parts,
            found,
        }),
        found if fragment && found != 1 => Err(WikiError::FragmentParts { found }),
        _ => Ok(()),
    }
}

/// Render with a fresh engine; the outline and settings are discarded.
pub fn render(parts: &Parts, options: RenderOptions, config: &EngineConfig) -> Result<String> {
    Wiki::new(config.clone()).process(parts, options)
}
