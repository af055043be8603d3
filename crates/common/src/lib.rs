//! ReviewForge Common Library
//!
//! Shared code for the scrape, clean and load tools including:
//! - Configuration management
//! - Error types and handling
//! - CSV row types shared between stages
//! - Database models and repository patterns
//! - Metrics names and tracing setup

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod records;
pub mod telemetry;
pub mod text;

// Re-export commonly used types
pub use config::{AppConfig, SourceConfig};
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use records::{CleanRecord, ReviewRecord};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
