//! Filedock Storage Library
//!
//! This crate provides the blob store abstraction and implementations.
//! It includes the Storage trait and backends for S3 and local filesystem.
//!
//! # Storage key format
//!
//! Keys are batch-scoped write prefixes. All backends use the same layout:
//!
//! `sites/{account_id}/{domain}/{YYYY-MM-DD}/{HHMM}/{filename}`
//!
//! with the batch start time truncated to the minute. Keys must not contain
//! `..` or a leading `/`. Key generation is centralized in the `keys` module
//! so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filedock_core::StorageBackend;
pub use keys::{batch_storage_location, file_storage_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
