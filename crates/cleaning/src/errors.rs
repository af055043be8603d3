//! Cleaning error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
