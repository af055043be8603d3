//! Row types shared by the scrape, clean and load stages
//!
//! Field order is the CSV column order; serde derives the header from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Provenance tag stamped on every scraped review
pub const PROVENANCE: &str = "google_play";

/// One scraped review as written to the per-bank and merged CSV files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Upstream review id, the dedup key across every stage
    pub review_id: Option<String>,
    pub bank: String,
    pub app_name: String,
    pub pkg: String,
    pub score: Option<i32>,
    pub content: Option<String>,
    pub content_clean: String,
    /// Creation time, RFC 3339 UTC
    pub at: Option<String>,
    pub review_created_version: Option<String>,
    pub reply_content: Option<String>,
    pub replied_at: Option<String>,
    pub thumbs_up_count: Option<i64>,
    pub source: String,
    pub scrape_run_id: String,
}

/// One row of the clean CSV consumed by the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub review_id: Option<String>,
    pub review: String,
    pub rating: Option<i32>,
    pub date: Option<NaiveDate>,
    pub bank: String,
    pub source: String,
    pub content_clean: String,
    pub lang: String,
    pub review_created_version: Option<String>,
    pub thumbs_up_count: Option<i64>,
    pub reply_content: Option<String>,
    pub replied_at: Option<String>,
}

impl CleanRecord {
    /// Clean CSV header, in column order
    pub const COLUMNS: [&'static str; 12] = [
        "review_id",
        "review",
        "rating",
        "date",
        "bank",
        "source",
        "content_clean",
        "lang",
        "review_created_version",
        "thumbs_up_count",
        "reply_content",
        "replied_at",
    ];

    /// Null flags per column, aligned with [`CleanRecord::COLUMNS`]
    pub fn null_mask(&self) -> [bool; 12] {
        [
            self.review_id.is_none(),
            false,
            self.rating.is_none(),
            self.date.is_none(),
            false,
            false,
            false,
            false,
            self.review_created_version.is_none(),
            self.thumbs_up_count.is_none(),
            self.reply_content.is_none(),
            self.replied_at.is_none(),
        ]
    }
}
