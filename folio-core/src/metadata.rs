//! Document metadata: the fields kept alongside a rendered document.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use folio_types::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::EngineConfig;
use crate::outline::Outline;
use crate::settings::Settings;
use crate::slug::slugify;

static INDEX_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\$ (AUTHOR|DATE) = |^- ").expect("valid index part regex")
});

/// Formats accepted for `$ DATE`, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%B %d, %Y", "%b %d, %Y"];

/// Build metadata from the settings and outline of a finished render.
///
/// `DATE` is read in the configured timezone; when it is missing the date
/// is `today`.
pub fn compile_metadata(
    settings: &Settings,
    outline: &Outline,
    config: &EngineConfig,
    doc_slug: Option<&str>,
    today: NaiveDate,
) -> Metadata {
    let title = settings.get_or("TITLE", "");
    let slug = match doc_slug {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&title),
    };
    let tz = parse_timezone(&config.timezone);

    let (date, date_utc) = match settings.get("DATE").map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => match parse_date(raw) {
            Some(day) => (
                day.format(&config.date_format).to_string(),
                Some(utc_stamp(day, tz)),
            ),
            None => {
                warn!(date = raw, "unrecognised DATE, keeping it as written");
                (raw.to_string(), None)
            }
        },
        None => (
            today.format(&config.date_format).to_string(),
            Some(utc_stamp(today, tz)),
        ),
    };

    Metadata {
        url: format!("/read/{}/{}", config.user, slug),
        title,
        user: config.user.clone(),
        slug,
        summary: settings.get_or("SUMMARY", ""),
        author: settings.get_or("AUTHOR", ""),
        email: settings.get_or("EMAIL", ""),
        license: settings.get_or("LICENSE", ""),
        publish: settings.get_or("PUBLISH", "YES"),
        todo: settings.get_or("TODO", ""),
        date,
        date_utc,
        word_count: outline.total_word_count(),
    }
}

/// Unknown names fall back to UTC.
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(timezone = name, "unknown timezone, using UTC");
        Tz::UTC
    })
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Local midnight of `day` in `tz`, as an RFC 3339 UTC stamp.
fn utc_stamp(day: NaiveDate, tz: Tz) -> String {
    let midnight = day.and_time(NaiveTime::MIN);
    let local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
    local.to_rfc3339()
}

/// Today's date in a timezone.
pub fn today_in(timezone: &str) -> NaiveDate {
    Utc::now().with_timezone(&parse_timezone(timezone)).date_naive()
}

/// `publish` is a `YYYY-MM-DD` date no later than today, or anything but
/// `NO`.
pub fn is_published(metadata: &Metadata, today: NaiveDate) -> bool {
    let publish = metadata.publish.trim();
    match NaiveDate::parse_from_str(publish, "%Y-%m-%d") {
        Ok(day) => day <= today,
        Err(_) => publish != "NO",
    }
}

/// `(published, unpublished)`.
pub fn split_published(articles: Vec<Metadata>, today: NaiveDate) -> (Vec<Metadata>, Vec<Metadata>) {
    articles
        .into_iter()
        .partition(|article| is_published(article, today))
}

/// `A / Affiliation + B / Affiliation` as authors, each a list of lines.
pub fn split_author(author: &str) -> Vec<Vec<String>> {
    if author.trim().is_empty() {
        return Vec::new();
    }
    author
        .split(" + ")
        .map(|block| block.split(" / ").map(|line| line.trim().to_string()).collect())
        .collect()
}

/// Twelve-column grid span for a number of authors.
pub fn author_cols(count: usize) -> usize {
    match count {
        1 => 12,
        2 => 6,
        3 => 4,
        4 => 6,
        _ => 4,
    }
}

/// True for text that looks like an index: author or date settings, or an
/// outline.
pub fn is_index_part(text: &str) -> bool {
    INDEX_PART_RE.is_match(text)
}
