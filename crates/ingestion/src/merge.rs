//! Merge per-bank CSVs into one file, first occurrence of each id wins

use crate::errors::IngestionError;
use crate::sink::source_file;
use reviewforge_common::records::ReviewRecord;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files_read: usize,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    /// Rows that could not be decoded, e.g. left torn by an interrupted write
    pub rows_skipped: usize,
    pub rows_written: usize,
}

/// Deduplicate records by `review_id`, keeping the first of each
///
/// Records without an id share one key, so at most one of them survives.
pub fn dedup_first_wins(records: impl IntoIterator<Item = ReviewRecord>) -> (Vec<ReviewRecord>, usize) {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = 0;

    for record in records {
        if seen.insert(record.review_id.clone()) {
            kept.push(record);
        } else {
            dropped += 1;
        }
    }

    (kept, dropped)
}

/// Concatenate `<out_dir>/<id>_reviews.csv` for each id, dedup, write `merged_path`
///
/// Missing per-bank files are skipped. When none exist nothing is written.
pub fn merge_sources(
    out_dir: &Path,
    source_ids: &[&str],
    merged_path: &Path,
) -> Result<MergeSummary, IngestionError> {
    let mut summary = MergeSummary::default();
    let mut all = Vec::new();

    for id in source_ids {
        let path = source_file(out_dir, id);
        if !path.exists() {
            warn!(source = %id, path = %path.display(), "No data file for source");
            continue;
        }

        let mut reader = csv::Reader::from_path(&path)?;
        for row in reader.deserialize::<ReviewRecord>() {
            match row {
                Ok(record) => all.push(record),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!(source = %id, error = %e, "Skipping undecodable row");
                    summary.rows_skipped += 1;
                }
            }
        }
        summary.files_read += 1;
    }

    if summary.files_read == 0 {
        warn!("No data files found, merged file not written");
        return Ok(summary);
    }

    summary.rows_read = all.len();
    let (kept, dropped) = dedup_first_wins(all);
    summary.duplicates_dropped = dropped;
    summary.rows_written = kept.len();

    if let Some(parent) = merged_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(merged_path)?;
    for record in &kept {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(
        path = %merged_path.display(),
        rows = summary.rows_written,
        duplicates = summary.duplicates_dropped,
        skipped = summary.rows_skipped,
        "Merged file saved"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{CsvAppendSink, RecordSink};

    fn record(id: Option<&str>, bank: &str, text: &str) -> ReviewRecord {
        ReviewRecord {
            review_id: id.map(str::to_string),
            bank: bank.into(),
            app_name: format!("{} Mobile", bank),
            pkg: format!("com.{}.app", bank.to_lowercase()),
            score: Some(5),
            content: Some(text.into()),
            content_clean: text.into(),
            at: None,
            review_created_version: None,
            reply_content: None,
            replied_at: None,
            thumbs_up_count: None,
            source: "google_play".into(),
            scrape_run_id: "run".into(),
        }
    }

    #[test]
    fn test_dedup_keeps_first() {
        let (kept, dropped) = dedup_first_wins(vec![
            record(Some("a"), "CBE", "first"),
            record(Some("b"), "CBE", "other"),
            record(Some("a"), "BOA", "second"),
            record(None, "BOA", "no id 1"),
            record(None, "BOA", "no id 2"),
        ]);
        assert_eq!(dropped, 2);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].content_clean, "first");
        assert_eq!(kept[2].content_clean, "no id 1");
    }

    #[test]
    fn test_merge_across_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvAppendSink::new(dir.path());
        sink.append("CBE", &[record(Some("x1"), "CBE", "one"), record(Some("dup"), "CBE", "cbe copy")])
            .unwrap();
        sink.append("BOA", &[record(Some("dup"), "BOA", "boa copy"), record(Some("x2"), "BOA", "two")])
            .unwrap();

        let merged = dir.path().join("merged_play_reviews.csv");
        let summary = merge_sources(dir.path(), &["CBE", "BOA", "Dashen"], &merged).unwrap();
        assert_eq!(summary.files_read, 2);
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(summary.rows_written, 3);

        let rows: Vec<ReviewRecord> = csv::Reader::from_path(&merged)
            .unwrap()
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        let dup = rows.iter().find(|r| r.review_id.as_deref() == Some("dup")).unwrap();
        assert_eq!(dup.bank, "CBE");
    }

    #[test]
    fn test_undecodable_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvAppendSink::new(dir.path());
        sink.append("CBE", &[record(Some("a"), "CBE", "one")]).unwrap();

        // Two rows fused by a torn write, followed by a healthy row
        let path = dir.path().join("CBE_reviews.csv");
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("c,CBE,A,p,4,hi thd,CBE,CBE Mobile,com.cbe.app,5,,,,,,,,google_play,run\n");
        fs::write(&path, text).unwrap();
        sink.append("CBE", &[record(Some("e"), "CBE", "three")]).unwrap();

        let merged = dir.path().join("merged.csv");
        let summary = merge_sources(dir.path(), &["CBE"], &merged).unwrap();
        assert_eq!(summary.rows_skipped, 1);
        assert_eq!(summary.rows_written, 2);

        let ids: Vec<_> = csv::Reader::from_path(&merged)
            .unwrap()
            .deserialize::<ReviewRecord>()
            .map(|row| row.unwrap().review_id.unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "e"]);
    }

    #[test]
    fn test_no_files_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let merged = dir.path().join("merged.csv");
        let summary = merge_sources(dir.path(), &["CBE"], &merged).unwrap();
        assert_eq!(summary, MergeSummary::default());
        assert!(!merged.exists());
    }
}
