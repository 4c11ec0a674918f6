use crate::error::MigrateError;
use crate::journal::frontmatter::split_frontmatter;
use crate::journal::metadata::Metadata;
use crate::journal::sections::parse_sections;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::Path;

const DATE_KEY: &str = "date";
const WEIGHT_KEY: &str = "weight";
const TAGS_KEY: &str = "tags";
const P_SCORE_KEYS: [&str; 3] = ["p-score", "p_score", "p"];
const L_SCORE_KEYS: [&str; 3] = ["l-score", "l_score", "l"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_PREFIX_CHARS: usize = 10;

/// One day of journal, shaped like a row of the `entries` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    pub morning: Option<String>,
    pub afternoon: Option<String>,
    pub night: Option<String>,
    pub highlights_high: Option<String>,
    pub highlights_low: Option<String>,
    pub p_score: Option<i64>,
    pub l_score: Option<i64>,
    pub weight: Option<f64>,
    pub tags: Vec<String>,
}

fn parse_date_prefix(raw: &str) -> Result<NaiveDate, MigrateError> {
    let head: String = raw.trim().chars().take(DATE_PREFIX_CHARS).collect();
    NaiveDate::parse_from_str(&head, DATE_FORMAT)
        .map_err(|_| MigrateError::InvalidDate(raw.trim().to_string()))
}

fn resolve_date(meta: &Metadata, file_stem: &str) -> Result<NaiveDate, MigrateError> {
    match meta.text(DATE_KEY)? {
        Some(raw) if !raw.is_empty() => parse_date_prefix(&raw),
        _ => parse_date_prefix(file_stem),
    }
}

/// Build an entry from the full text of a note. `file_stem` is the file name
/// without `.md`, used for the date when the frontmatter has none.
pub fn parse_entry_text(text: &str, file_stem: &str) -> Result<JournalEntry, MigrateError> {
    let doc = split_frontmatter(text)?;
    let meta = Metadata::from(doc.fields);

    let date = resolve_date(&meta, file_stem)?;
    let tags = meta.tags(TAGS_KEY)?;
    let sections = parse_sections(doc.body);

    Ok(JournalEntry {
        date,
        morning: sections.morning,
        afternoon: sections.afternoon,
        night: sections.night,
        highlights_high: sections.highlights_high,
        highlights_low: sections.highlights_low,
        p_score: meta.int_first(&P_SCORE_KEYS),
        l_score: meta.int_first(&L_SCORE_KEYS),
        weight: meta.float(WEIGHT_KEY),
        tags,
    })
}

pub fn parse_entry(path: &Path) -> Result<JournalEntry> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_suffix(".md").unwrap_or(name))
        .unwrap_or_default();
    let entry = parse_entry_text(&text, stem)?;
    Ok(entry)
}
