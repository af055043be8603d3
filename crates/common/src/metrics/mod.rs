//! Metrics names, registration and export
//!
//! Counters go through the `metrics` facade. The batch tools install a
//! Prometheus recorder at startup and dump its text rendering when the run
//! ends, either to `observability.metrics_path` (for a textfile collector) or
//! to the debug log.

use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Metrics prefix for all ReviewForge metrics
pub const METRICS_PREFIX: &str = "reviewforge";

pub const REVIEWS_FETCHED: &str = "reviewforge_reviews_fetched_total";
pub const FETCH_ERRORS: &str = "reviewforge_fetch_errors_total";
pub const SOURCES_ABANDONED: &str = "reviewforge_sources_abandoned_total";
pub const REVIEWS_LOADED: &str = "reviewforge_reviews_loaded_total";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        REVIEWS_FETCHED,
        Unit::Count,
        "Reviews fetched from the upstream listing service"
    );

    describe_counter!(
        FETCH_ERRORS,
        Unit::Count,
        "Failed upstream fetch attempts"
    );

    describe_counter!(
        SOURCES_ABANDONED,
        Unit::Count,
        "Banks abandoned after exhausting fetch attempts"
    );

    describe_counter!(
        REVIEWS_LOADED,
        Unit::Count,
        "Review rows inserted into the relational store"
    );
}

/// Install the global Prometheus recorder; call before [`register_metrics`]
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Write the current snapshot to `path`, or log it when no path is configured
pub fn export_snapshot(handle: &PrometheusHandle, path: Option<&Path>) -> io::Result<()> {
    let rendered = handle.render();

    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, rendered)?;
            debug!(path = %path.display(), "Metrics snapshot written");
        }
        None => debug!(metrics = %rendered, "Metrics snapshot"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::counter;

    #[test]
    fn test_metric_names_share_prefix() {
        for name in [REVIEWS_FETCHED, FETCH_ERRORS, SOURCES_ABANDONED, REVIEWS_LOADED] {
            assert!(name.starts_with(METRICS_PREFIX));
            assert!(name.ends_with("_total"));
        }
    }

    #[test]
    fn test_snapshot_contains_recorded_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            counter!(REVIEWS_LOADED).increment(6);
            counter!(FETCH_ERRORS, "source" => "CBE").increment(2);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics").join("load.prom");
        export_snapshot(&handle, Some(&path)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let sample = |name: &str| {
            text.lines()
                .find(|line| line.starts_with(name))
                .unwrap()
                .to_string()
        };
        assert!(sample(REVIEWS_LOADED).ends_with(" 6"));

        let errors = sample(FETCH_ERRORS);
        assert!(errors.contains("source=\"CBE\""));
        assert!(errors.ends_with(" 2"));
    }
}
