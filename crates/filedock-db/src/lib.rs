//! Filedock database layer
//!
//! Postgres implementations of the store traits from `filedock-core`, using
//! dynamic SQLx queries (no DATABASE_URL required at build time). Schema DDL
//! lives under `migrations/`.

pub mod db;

pub use db::{PgBatchStore, PgUploadedFileStore};
