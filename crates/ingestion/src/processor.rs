//! Ingestion processor
//!
//! Drives each configured bank through fetch -> normalize -> append -> checkpoint
//! until its target is met, upstream runs dry, or fetch attempts run out.
//! Banks are processed one after another; a bank that keeps failing is
//! abandoned and the run moves on.

use crate::errors::IngestionError;
use crate::fetcher::{BatchRequest, ReviewSource};
use crate::normalizer::{normalize, RecordStamp};
use crate::sink::RecordSink;
use crate::state::{ResumeState, StateStore};
use metrics::counter;
use reviewforge_common::config::{ScrapeConfig, UpstreamConfig};
use reviewforge_common::metrics::{FETCH_ERRORS, REVIEWS_FETCHED, SOURCES_ABANDONED};
use reviewforge_common::SourceConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Limits and pacing for the loop
#[derive(Debug, Clone)]
pub struct IngestionPolicy {
    pub min_per_source: u64,
    pub batch_size: usize,
    pub lang: String,
    pub country: String,
    pub pause_between_batches: Duration,
    pub pause_between_sources: Duration,
    pub retry_delay: Duration,
    /// Failed fetches per bank before it is abandoned
    pub max_attempts: u32,
}

impl IngestionPolicy {
    pub fn from_config(scrape: &ScrapeConfig, upstream: &UpstreamConfig) -> Self {
        Self {
            min_per_source: scrape.min_per_source,
            batch_size: scrape.batch_size,
            lang: upstream.lang.clone(),
            country: upstream.country.clone(),
            pause_between_batches: scrape.batch_pause(),
            pause_between_sources: scrape.source_pause(),
            retry_delay: scrape.retry_delay(),
            max_attempts: scrape.max_attempts.max(1),
        }
    }
}

/// Why a bank's loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// fetched_count reached the configured minimum
    TargetReached,
    /// Upstream returned no items or no further cursor
    Exhausted,
    /// Every allowed fetch attempt failed
    Abandoned { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source_id: String,
    pub status: SourceStatus,
    /// Running total, including counts from earlier runs
    pub fetched_count: u64,
    /// Reviews appended during this run
    pub fetched_this_run: u64,
}

/// Ingestion processor
pub struct IngestionProcessor {
    source: Arc<dyn ReviewSource>,
    sink: Box<dyn RecordSink>,
    store: StateStore,
    policy: IngestionPolicy,
    run_id: String,
}

impl IngestionProcessor {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        sink: Box<dyn RecordSink>,
        store: StateStore,
        policy: IngestionPolicy,
        run_id: String,
    ) -> Self {
        Self {
            source,
            sink,
            store,
            policy,
            run_id,
        }
    }

    /// Process every bank in order; only local I/O failures abort the run
    pub async fn run(&mut self, sources: &[SourceConfig]) -> Result<Vec<SourceOutcome>, IngestionError> {
        let mut state = self.store.load()?;
        let mut outcomes = Vec::with_capacity(sources.len());

        info!(
            run_id = %self.run_id,
            sources = sources.len(),
            target = self.policy.min_per_source,
            "Starting ingestion run"
        );

        for (index, source) in sources.iter().enumerate() {
            let outcome = self.ingest_source(&mut state, source).await?;
            info!(
                source = %outcome.source_id,
                status = ?outcome.status,
                fetched = outcome.fetched_count,
                fetched_this_run = outcome.fetched_this_run,
                "Source finished"
            );
            outcomes.push(outcome);

            if index + 1 < sources.len() {
                tokio::time::sleep(self.policy.pause_between_sources).await;
            }
        }

        Ok(outcomes)
    }

    #[instrument(skip(self, state, source), fields(source = %source.id))]
    async fn ingest_source(
        &mut self,
        state: &mut ResumeState,
        source: &SourceConfig,
    ) -> Result<SourceOutcome, IngestionError> {
        let mut cursor = state.get(&source.id);
        let starting_count = cursor.fetched_count;
        info!(already_fetched = starting_count, "Starting source");

        let outcome = |status, fetched_count| SourceOutcome {
            source_id: source.id.clone(),
            status,
            fetched_count,
            fetched_this_run: fetched_count - starting_count,
        };

        if cursor.is_exhausted() {
            info!("Upstream exhausted in an earlier run, skipping");
            return Ok(outcome(SourceStatus::Exhausted, cursor.fetched_count));
        }

        let stamp = RecordStamp {
            source,
            run_id: &self.run_id,
        };
        let mut attempts = 0u32;

        while cursor.fetched_count < self.policy.min_per_source {
            let request = BatchRequest {
                package: source.package.clone(),
                lang: self.policy.lang.clone(),
                country: self.policy.country.clone(),
                count: self.policy.batch_size,
                token: cursor.token.clone(),
            };

            let batch = match self.source.fetch_batch(&request).await {
                Ok(batch) => batch,
                Err(e) => {
                    attempts += 1;
                    counter!(FETCH_ERRORS, "source" => source.id.clone()).increment(1);
                    warn!(
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Fetch failed"
                    );

                    if attempts >= self.policy.max_attempts {
                        error!(attempts, "Too many fetch errors, abandoning source");
                        counter!(SOURCES_ABANDONED, "source" => source.id.clone()).increment(1);
                        return Ok(outcome(
                            SourceStatus::Abandoned { attempts },
                            cursor.fetched_count,
                        ));
                    }

                    tokio::time::sleep(self.policy.retry_delay).await;
                    continue;
                }
            };

            if batch.items.is_empty() {
                info!("No more reviews returned");
                return Ok(outcome(SourceStatus::Exhausted, cursor.fetched_count));
            }

            let records: Vec<_> = batch.items.iter().map(|raw| normalize(raw, &stamp)).collect();
            self.sink.append(&source.id, &records)?;

            cursor.fetched_count += records.len() as u64;
            cursor.token = batch.next_token;
            state.set(&source.id, cursor.clone());
            self.store.save(state)?;

            counter!(REVIEWS_FETCHED, "source" => source.id.clone()).increment(records.len() as u64);
            info!(
                batch = records.len(),
                total = cursor.fetched_count,
                "Batch persisted"
            );

            if cursor.token.is_none() {
                info!("Upstream returned no continuation token");
                return Ok(outcome(SourceStatus::Exhausted, cursor.fetched_count));
            }

            tokio::time::sleep(self.policy.pause_between_batches).await;
        }

        Ok(outcome(SourceStatus::TargetReached, cursor.fetched_count))
    }
}
