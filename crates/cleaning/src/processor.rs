//! Cleaning pipeline
//!
//! merged CSV -> dedup by id -> text normalization -> language + date -> clean CSV

use crate::dates::parse_review_date;
use crate::errors::CleaningError;
use crate::language::detect_language;
use reviewforge_common::records::{CleanRecord, ReviewRecord};
use reviewforge_common::text::collapse_whitespace;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Share of null values per clean column
#[derive(Debug, Clone, PartialEq)]
pub struct MissingnessReport {
    pub columns: Vec<(&'static str, f64)>,
}

impl MissingnessReport {
    pub fn compute(records: &[CleanRecord]) -> Self {
        let mut nulls = [0usize; 12];
        for record in records {
            for (count, is_null) in nulls.iter_mut().zip(record.null_mask()) {
                *count += usize::from(is_null);
            }
        }

        let total = records.len();
        let columns = CleanRecord::COLUMNS
            .iter()
            .zip(nulls)
            .map(|(name, count)| {
                let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
                (*name, share)
            })
            .collect();

        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, share)| *share)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub rows_written: usize,
    pub missing: MissingnessReport,
}

/// Map one merged row to its clean projection
pub fn clean_record(record: ReviewRecord, min_detect_chars: usize) -> CleanRecord {
    let review = record.content.unwrap_or_default();
    let content_clean = collapse_whitespace(&review);
    let lang = detect_language(&content_clean, min_detect_chars);
    let date = record.at.as_deref().and_then(parse_review_date);

    CleanRecord {
        review_id: record.review_id,
        review,
        rating: record.score,
        date,
        bank: record.bank,
        source: record.source,
        content_clean,
        lang: lang.code().to_string(),
        review_created_version: record.review_created_version,
        thumbs_up_count: record.thumbs_up_count,
        reply_content: record.reply_content,
        replied_at: record.replied_at,
    }
}

/// Drop repeated ids (first wins) and clean the rest; returns rows and drop count
pub fn clean_records(
    records: impl IntoIterator<Item = ReviewRecord>,
    min_detect_chars: usize,
) -> (Vec<CleanRecord>, usize) {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();
    let mut dropped = 0;

    for record in records {
        if !seen.insert(record.review_id.clone()) {
            dropped += 1;
            continue;
        }
        cleaned.push(clean_record(record, min_detect_chars));
    }

    (cleaned, dropped)
}

/// Read `input`, clean it and write `output`
pub fn clean_file(
    input: &Path,
    output: &Path,
    min_detect_chars: usize,
) -> Result<CleaningReport, CleaningError> {
    if !input.exists() {
        return Err(CleaningError::InputNotFound(input.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(input)?;
    let records = reader
        .deserialize::<ReviewRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    let rows_read = records.len();

    let (cleaned, duplicates_dropped) = clean_records(records, min_detect_chars);
    let missing = MissingnessReport::compute(&cleaned);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(output)?;
    for record in &cleaned {
        writer.serialize(record)?;
    }
    writer.flush()?;

    for (column, share) in &missing.columns {
        info!(column, missing_pct = share * 100.0, "Missing values");
    }
    info!(
        path = %output.display(),
        rows = cleaned.len(),
        duplicates = duplicates_dropped,
        "Saved cleaned CSV"
    );

    Ok(CleaningReport {
        rows_read,
        duplicates_dropped,
        rows_written: cleaned.len(),
        missing,
    })
}
