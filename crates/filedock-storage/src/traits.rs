//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob store backends must
//! implement.

use async_trait::async_trait;
use bytes::Bytes;
use filedock_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All blob store backends (S3, local filesystem) must implement this trait.
/// This allows the upload pipeline to persist file bytes without coupling to
/// specific backend details.
///
/// **Key format:** Keys are batch-scoped write prefixes produced by the `keys`
/// module: `sites/{account_id}/{domain}/{date}/{minute}/{filename}`. Keys must
/// not contain `..` or a leading `/`.
///
/// This system never deletes blobs: cancelled and expired batches keep any
/// files already written, and orphaned blobs from failed metadata writes are
/// left for out-of-band reconciliation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a blob at the given key. A write that returns Ok must be durable.
    async fn put(&self, storage_key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Check if a blob exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of a blob, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
