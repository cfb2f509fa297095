//! Database repositories for data access layer
//!
//! Each repository implements one store trait from `filedock-core` against
//! Postgres. Both guards the engine leans on live here: the partial unique
//! index enforcing one Active batch per site, and the `(batch_id,
//! original_name)` uniqueness for uploaded files.

pub mod batch;
pub mod uploaded_file;

pub use batch::PgBatchStore;
pub use uploaded_file::PgUploadedFileStore;

/// Whether a sqlx error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
