//! ReviewForge scraper
//!
//! 1. Loads resume state
//! 2. Pages through each bank's reviews until the target count is met
//! 3. Appends every batch to the bank's CSV and checkpoints the cursor
//! 4. Merges the per-bank files into one deduplicated CSV

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use reviewforge_common::{config::AppConfig, metrics, telemetry, VERSION};
use reviewforge_ingestion::{
    merge::merge_sources, CsvAppendSink, IngestionPolicy, IngestionProcessor, PlayStoreClient,
    SourceStatus, StateStore,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    telemetry::init_tracing(&config.observability);
    let recorder = metrics::install_recorder()
        .map_err(|e| warn!(error = %e, "Metrics recorder not installed"))
        .ok();
    metrics::register_metrics();

    info!("Starting ReviewForge scraper v{}", VERSION);

    let run_id = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let client = PlayStoreClient::new(&config.upstream).context("Failed to build HTTP client")?;

    let mut processor = IngestionProcessor::new(
        Arc::new(client),
        Box::new(CsvAppendSink::new(&config.scrape.out_dir)),
        StateStore::new(config.state_path()),
        IngestionPolicy::from_config(&config.scrape, &config.upstream),
        run_id,
    );

    let outcomes = processor
        .run(&config.sources)
        .await
        .context("Ingestion run failed")?;

    for outcome in &outcomes {
        if let SourceStatus::Abandoned { attempts } = outcome.status {
            warn!(
                source = %outcome.source_id,
                attempts,
                fetched = outcome.fetched_count,
                "Source abandoned; rerun to resume from its last checkpoint"
            );
        }
    }

    let ids: Vec<&str> = config.sources.iter().map(|s| s.id.as_str()).collect();
    let summary = merge_sources(&config.scrape.out_dir, &ids, &config.merged_path())
        .context("Failed to merge per-bank files")?;

    info!(
        files = summary.files_read,
        rows = summary.rows_written,
        duplicates = summary.duplicates_dropped,
        skipped = summary.rows_skipped,
        "Scrape complete"
    );

    if let Some(handle) = &recorder {
        metrics::export_snapshot(handle, config.observability.metrics_path.as_deref())
            .context("Failed to export metrics")?;
    }

    Ok(())
}
