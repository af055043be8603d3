//! ReviewForge loader
//!
//! Idempotent load of the clean review table into `banks` and `reviews`.

pub mod processor;

pub use processor::{LoadSummary, ReviewLoader};
