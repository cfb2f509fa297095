//! Filedock Core Library
//!
//! This crate provides the domain models, batch lifecycle state machine,
//! checksum value objects, error types, configuration, and store trait seams
//! shared across all Filedock components.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod partition;
pub mod storage_types;
pub mod stores;

// Re-export commonly used types
pub use checksum::{ChecksumAlgorithm, FileChecksum, Sha256Hasher};
pub use config::IngestConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Batch, BatchStatus, UploadRequest, UploadedFile};
pub use storage_types::StorageBackend;
pub use stores::{BatchStore, UploadedFileStore};
