//! ReviewForge cleaning
//!
//! Turns the merged scrape output into the analysis-ready review table:
//! duplicate ids dropped, text whitespace-normalized, dates coerced and a
//! language tag attached to every row.

pub mod dates;
pub mod errors;
pub mod language;
pub mod processor;

pub use errors::CleaningError;
pub use language::{detect_language, Language};
pub use processor::{clean_file, clean_records, CleaningReport, MissingnessReport};
