//! Error types module
//!
//! This module provides the core error types used throughout Filedock.
//! All errors are unified under the `AppError` enum, which covers database,
//! storage, admission, and batch lifecycle failures.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature. With `default-features = false`, build without the `sqlx` feature;
//! then `AppError` has no database variant.

use std::io;

use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::batch::BatchStatus;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics
/// for the (out of scope) HTTP layer.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ACTIVE_BATCH_EXISTS")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition for batch {batch_id}: {from} -> {attempted}")]
    InvalidStateTransition {
        batch_id: Uuid,
        from: BatchStatus,
        attempted: BatchStatus,
    },

    #[error("Batch {batch_id} is not accepting uploads (status: {status})")]
    NotAcceptingUploads { batch_id: Uuid, status: BatchStatus },

    #[error("An active batch already exists for site {site_id}")]
    ActiveBatchExists { site_id: Uuid },

    #[error("Concurrency limit exceeded for account {account_id}: {active} active batches, limit {limit}")]
    ConcurrencyLimitExceeded {
        account_id: Uuid,
        active: i64,
        limit: i64,
    },

    #[error("Duplicate file name in batch {batch_id}: {file_name}")]
    DuplicateFileName { batch_id: Uuid, file_name: String },

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Version conflict on batch {batch_id}: concurrent modification")]
    VersionConflict { batch_id: Uuid },

    #[error("Internal error: {0}")]
    Internal(String),
}

// Error conversion implementations
#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// suggested_action, sensitive, log_level). Reduces duplication in the
/// ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            false,
            Some("Re-submit the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidStateTransition { .. } => (
            409,
            "INVALID_STATE_TRANSITION",
            false,
            Some("Check the batch status before retrying"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotAcceptingUploads { .. } => (
            409,
            "BATCH_NOT_ACCEPTING_UPLOADS",
            false,
            Some("Start a new batch for this site"),
            false,
            LogLevel::Debug,
        ),
        AppError::ActiveBatchExists { .. } => (
            409,
            "ACTIVE_BATCH_EXISTS",
            false,
            Some("Complete or cancel the existing batch first"),
            false,
            LogLevel::Debug,
        ),
        AppError::ConcurrencyLimitExceeded { .. } => (
            409,
            "CONCURRENCY_LIMIT_EXCEEDED",
            true,
            Some("Wait for an active batch to finish and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::DuplicateFileName { .. } => (
            409,
            "DUPLICATE_FILE_NAME",
            false,
            Some("Use a different file name within this batch"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::VersionConflict { .. } => (
            409,
            "VERSION_CONFLICT",
            true,
            Some("Re-read the batch and retry"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidStateTransition { .. } => "InvalidStateTransition",
            AppError::NotAcceptingUploads { .. } => "NotAcceptingUploads",
            AppError::ActiveBatchExists { .. } => "ActiveBatchExists",
            AppError::ConcurrencyLimitExceeded { .. } => "ConcurrencyLimitExceeded",
            AppError::DuplicateFileName { .. } => "DuplicateFileName",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::VersionConflict { .. } => "VersionConflict",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Whether this error is a conflict kind (maps to HTTP 409)
    pub fn is_conflict(&self) -> bool {
        self.http_status_code() == 409
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            // Never leak storage-backend details to clients.
            AppError::Storage(_) => "Failed to store file data".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
