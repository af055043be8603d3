//! ReviewForge cleaner
//!
//! Reads the merged review CSV and writes the clean projection.

use anyhow::Context;
use reviewforge_common::{config::AppConfig, telemetry, VERSION};
use reviewforge_cleaning::clean_file;
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.observability);

    info!("Starting ReviewForge cleaner v{}", VERSION);

    let input = config.clean_input_path();
    let report = clean_file(&input, &config.clean.output_path, config.clean.min_detect_chars)
        .with_context(|| format!("Failed to clean {}", input.display()))?;

    info!(
        rows_read = report.rows_read,
        duplicates = report.duplicates_dropped,
        rows_written = report.rows_written,
        "Cleaning complete"
    );

    Ok(())
}
