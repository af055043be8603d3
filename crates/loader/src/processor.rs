//! Loader processor
//!
//! Loads clean review rows into the relational store:
//! 1. Ensure the `banks` and `reviews` tables exist
//! 2. Insert each distinct bank, ignoring ones already present
//! 3. Read back the generated bank keys
//! 4. Insert every review keyed on its natural id, ignoring ones already present
//!
//! Nothing is ever updated, so loading the same file twice is a no-op.

use metrics::counter;
use reviewforge_common::db::NewReview;
use reviewforge_common::metrics::REVIEWS_LOADED;
use reviewforge_common::{AppError, CleanRecord, Repository, Result, SourceConfig};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Counts from one load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub banks_inserted: u64,
    pub reviews_inserted: u64,
    /// Reviews whose id was already stored
    pub reviews_ignored: u64,
    /// Rows with no review id
    pub rows_skipped: u64,
}

/// Review loader
pub struct ReviewLoader {
    repo: Repository,
    app_names: HashMap<String, String>,
}

impl ReviewLoader {
    pub fn new(repo: Repository, sources: &[SourceConfig]) -> Self {
        let app_names = sources
            .iter()
            .map(|s| (s.id.clone(), s.app_name.clone()))
            .collect();

        Self { repo, app_names }
    }

    /// Read a clean CSV and load it
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load_file(&self, path: &Path) -> Result<LoadSummary> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize::<CleanRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        info!(rows = records.len(), "Read clean reviews");
        self.load_records(&records).await
    }

    pub async fn load_records(&self, records: &[CleanRecord]) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        self.repo.ensure_schema().await?;

        // Banks in first-seen order
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(record.bank.as_str()) {
                continue;
            }
            let app_name = self.app_name(&record.bank)?;
            if self.repo.insert_bank(&record.bank, app_name).await? {
                summary.banks_inserted += 1;
            }
        }

        let bank_ids = self.repo.bank_ids().await?;

        for record in records {
            let Some(review_id) = record.review_id.clone() else {
                warn!(bank = %record.bank, "Skipping review without an id");
                summary.rows_skipped += 1;
                continue;
            };

            let bank_id = *bank_ids
                .get(&record.bank)
                .ok_or_else(|| AppError::UnknownSource {
                    bank: record.bank.clone(),
                })?;

            let inserted = self
                .repo
                .insert_review(NewReview {
                    review_id,
                    bank_id,
                    review_text: (!record.review.is_empty()).then(|| record.review.clone()),
                    rating: record.rating,
                    review_date: record.date,
                    source: Some(record.source.clone()),
                })
                .await?;

            if inserted {
                summary.reviews_inserted += 1;
            } else {
                summary.reviews_ignored += 1;
            }
        }

        counter!(REVIEWS_LOADED).increment(summary.reviews_inserted);
        info!(
            banks_inserted = summary.banks_inserted,
            reviews_inserted = summary.reviews_inserted,
            reviews_ignored = summary.reviews_ignored,
            rows_skipped = summary.rows_skipped,
            "Load complete"
        );

        Ok(summary)
    }

    fn app_name(&self, bank: &str) -> Result<&str> {
        self.app_names
            .get(bank)
            .map(String::as_str)
            .ok_or_else(|| AppError::UnknownSource {
                bank: bank.to_string(),
            })
    }
}
