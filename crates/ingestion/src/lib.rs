//! ReviewForge ingestion
//!
//! Resumable, rate-limited scraping of bank app reviews into per-bank CSV
//! files, followed by a merge into one deduplicated file.

pub mod errors;
pub mod fetcher;
pub mod merge;
pub mod normalizer;
pub mod processor;
pub mod sink;
pub mod state;

pub use errors::IngestionError;
pub use fetcher::{Batch, BatchRequest, PlayStoreClient, RawReview, ReviewSource};
pub use processor::{IngestionPolicy, IngestionProcessor, SourceOutcome, SourceStatus};
pub use sink::{CsvAppendSink, RecordSink};
pub use state::{ResumeState, SourceState, StateStore};
