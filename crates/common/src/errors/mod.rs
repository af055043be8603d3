//! Error types for ReviewForge tools
//!
//! Provides the shared error type used by the persistence layer and the loader:
//! - Distinct variants for store, file and configuration failures
//! - Error codes for log correlation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Resource errors (4xxx)
    UnknownSource,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::UnknownSource => 4001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bank {bank} is not in the configured source list")]
    UnknownSource { bank: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::UnknownSource { .. } => ErrorCode::UnknownSource,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::Csv(_) => ErrorCode::SerializationError,
        }
    }

    /// Persistence failures are never masked; callers abort the run on these
    pub fn is_store_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::DatabaseError | ErrorCode::ConnectionError
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::UnknownSource { bank: "NIB".into() };
        assert_eq!(err.code(), ErrorCode::UnknownSource);
        assert_eq!(err.code().as_code(), 4001);
        assert!(!err.is_store_error());
    }

    #[test]
    fn test_store_errors() {
        let err = AppError::DatabaseConnection {
            message: "refused".into(),
        };
        assert!(err.is_store_error());

        let err = AppError::Database(sea_orm::DbErr::Custom("boom".into()));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(err.is_store_error());
    }

    #[test]
    fn test_io_error_is_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.to_string().contains("gone"));
    }
}
