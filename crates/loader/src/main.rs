//! ReviewForge loader
//!
//! Loads the clean review CSV into the relational store.

use anyhow::Context;
use reviewforge_common::{
    config::AppConfig, metrics, telemetry, AppError, DbPool, Repository, VERSION,
};
use reviewforge_loader::ReviewLoader;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(AppError::from)?;

    telemetry::init_tracing(&config.observability);
    let recorder = metrics::install_recorder()
        .map_err(|e| warn!(error = %e, "Metrics recorder not installed"))
        .ok();
    metrics::register_metrics();

    info!("Starting ReviewForge loader v{}", VERSION);

    if let Err(e) = run(&config).await {
        error!(
            code = e.code().as_code(),
            store = e.is_store_error(),
            error = %e,
            "Load failed"
        );
        return Err(e.into());
    }

    if let Some(handle) = &recorder {
        metrics::export_snapshot(handle, config.observability.metrics_path.as_deref())
            .context("Failed to export metrics")?;
    }

    Ok(())
}

async fn run(config: &AppConfig) -> reviewforge_common::Result<()> {
    let pool = DbPool::new(&config.database).await?;
    let repo = Repository::new(pool);
    repo.ping().await?;

    let loader = ReviewLoader::new(repo, &config.sources);
    loader.load_file(&config.clean.output_path).await?;

    Ok(())
}
