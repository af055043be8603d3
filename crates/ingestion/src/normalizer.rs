//! Raw upstream review -> [`ReviewRecord`]

use crate::fetcher::RawReview;
use chrono::{DateTime, SecondsFormat, Utc};
use reviewforge_common::records::{ReviewRecord, PROVENANCE};
use reviewforge_common::text::collapse_whitespace;
use reviewforge_common::SourceConfig;

/// Constants stamped on every record of one bank within one run
#[derive(Debug, Clone)]
pub struct RecordStamp<'a> {
    pub source: &'a SourceConfig,
    pub run_id: &'a str,
}

/// Map one raw review into a flat record; missing fields stay null
pub fn normalize(raw: &RawReview, stamp: &RecordStamp<'_>) -> ReviewRecord {
    ReviewRecord {
        review_id: raw.review_id.clone(),
        bank: stamp.source.id.clone(),
        app_name: stamp.source.app_name.clone(),
        pkg: stamp.source.package.clone(),
        score: raw.score.and_then(|s| i32::try_from(s).ok()),
        content: raw.content.clone(),
        content_clean: raw
            .content
            .as_deref()
            .map(collapse_whitespace)
            .unwrap_or_default(),
        at: raw.at.as_ref().map(canonical_timestamp),
        review_created_version: raw.review_created_version.clone(),
        reply_content: raw.reply_content.clone(),
        replied_at: raw.replied_at.as_ref().map(canonical_timestamp),
        thumbs_up_count: raw.thumbs_up_count,
        source: PROVENANCE.to_string(),
        scrape_run_id: stamp.run_id.to_string(),
    }
}

/// RFC 3339, second precision, `Z` suffix
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
