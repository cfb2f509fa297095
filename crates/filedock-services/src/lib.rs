//! Filedock Services Layer
//!
//! This crate is the ingest engine: batch admission control, the upload
//! pipeline, the timeout sweeper, and the error attachment hook. It
//! re-exports a unified API from the core, db, and storage crates so callers
//! depend on a single service facade.

pub mod admission;
pub mod error_hook;
pub mod sweeper;
pub mod upload;

pub use admission::AdmissionService;
pub use error_hook::ErrorAttachmentHook;
pub use sweeper::{BatchSweeper, SweepOutcome};
pub use upload::UploadService;

pub use filedock_core::{
    AppError, Batch, BatchStatus, ErrorMetadata, FileChecksum, IngestConfig, UploadRequest,
    UploadedFile,
};
pub use filedock_core::stores::{BatchStore, UploadedFileStore};
pub use filedock_db::{PgBatchStore, PgUploadedFileStore};
pub use filedock_storage::{
    create_storage, LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult,
};
