//! Configuration management for ReviewForge tools
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values matching the bank list and scrape limits the pipeline ships with

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Banks whose apps are scraped, in processing order
    pub sources: Vec<SourceConfig>,

    /// Ingestion loop limits and output locations
    pub scrape: ScrapeConfig,

    /// Upstream review listing service
    pub upstream: UpstreamConfig,

    /// Cleaning stage input/output
    pub clean: CleanConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

/// One bank app to scrape
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Short bank identifier, also used in file names ("CBE")
    pub id: String,

    /// Store package identifier
    pub package: String,

    /// Human readable app name
    pub app_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Directory holding per-bank CSVs, the merged CSV and the state file
    pub out_dir: PathBuf,

    /// State file name inside `out_dir`
    pub state_file: String,

    /// Merged CSV file name inside `out_dir`
    pub merged_file: String,

    /// Stop fetching a bank once this many reviews were collected
    pub min_per_source: u64,

    /// Reviews requested per upstream call
    pub batch_size: usize,

    pub pause_between_batches_ms: u64,

    pub pause_between_sources_ms: u64,

    /// Delay after a failed fetch before retrying
    pub retry_delay_ms: u64,

    /// Failed fetches tolerated per bank before it is abandoned
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Store base URL (overridable for staging mirrors)
    pub base_url: String,

    /// Review language (`hl`)
    pub lang: String,

    /// Store country (`gl`)
    pub country: String,

    /// Sort order code; 2 = newest first
    pub sort: u8,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Merged CSV to clean; defaults to the scrape output
    pub input_path: Option<PathBuf>,

    /// Clean CSV destination
    pub output_path: PathBuf,

    /// Texts shorter than this are tagged `unknown` without detection
    pub min_detect_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (postgres:// in production, sqlite:: in tests)
    pub url: String,

    /// Maximum number of connections
    pub max_connections: u32,

    /// Minimum number of connections
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error); RUST_LOG wins when set
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Where to write the Prometheus text snapshot when a run ends
    pub metrics_path: Option<PathBuf>,
}

// Default value functions
fn default_sources() -> Vec<SourceConfig> {
    [
        ("CBE", "com.combanketh.mobilebanking", "Commercial Bank of Ethiopia Mobile"),
        ("BOA", "com.boa.boaMobileBanking", "Bank of Abyssinia Mobile"),
        ("Dashen", "com.dashen.dashensuperapp", "Dashen Bank Mobile"),
    ]
    .into_iter()
    .map(|(id, package, app_name)| SourceConfig {
        id: id.to_string(),
        package: package.to_string(),
        app_name: app_name.to_string(),
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            scrape: ScrapeConfig::default(),
            upstream: UpstreamConfig::default(),
            clean: CleanConfig::default(),
            database: DatabaseConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("scrape_output"),
            state_file: "scrape_state.json".to_string(),
            merged_file: "merged_play_reviews.csv".to_string(),
            min_per_source: 400,
            batch_size: 200,
            pause_between_batches_ms: 1_000,
            pause_between_sources_ms: 2_000,
            retry_delay_ms: 5_000,
            max_attempts: 6,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.google.com".to_string(),
            lang: "en".to_string(),
            country: "et".to_string(),
            sort: 2,
            timeout_secs: 30,
        }
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_path: PathBuf::from("data/play_reviews_clean.csv"),
            min_detect_chars: 3,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/bank_reviews".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
            metrics_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Look up a configured bank by its identifier
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Path of the resume state file
    pub fn state_path(&self) -> PathBuf {
        self.scrape.out_dir.join(&self.scrape.state_file)
    }

    /// Path of the merged CSV written after scraping
    pub fn merged_path(&self) -> PathBuf {
        self.scrape.out_dir.join(&self.scrape.merged_file)
    }

    /// Cleaning input, falling back to the merged scrape output
    pub fn clean_input_path(&self) -> PathBuf {
        self.clean
            .input_path
            .clone()
            .unwrap_or_else(|| self.merged_path())
    }
}

impl ScrapeConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.pause_between_batches_ms)
    }

    pub fn source_pause(&self) -> Duration {
        Duration::from_millis(self.pause_between_sources_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl UpstreamConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
