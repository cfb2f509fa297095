//! Store trait seams for batch and file metadata persistence.
//!
//! These traits let the service layer work against any persistence backend
//! without coupling to implementation details. The Postgres implementations
//! live in `filedock-db`; tests use in-memory doubles with the same
//! semantics. Two guarantees are the backend's responsibility, not the
//! caller's: the one-active-batch-per-site rule and the
//! `(batch_id, original_name)` uniqueness rule are enforced at the storage
//! layer, because an application-level check alone can race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Batch, UploadedFile};

/// Persistence for batches.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist a newly admitted Active batch.
    ///
    /// This is the authoritative admission arbiter: implementations must
    /// serialize concurrent inserts for the same account, re-count that
    /// account's Active batches against `account_budget`, and enforce the
    /// one-Active-per-site rule, all atomically with the insert. Failures
    /// map to `ActiveBatchExists` / `ConcurrencyLimitExceeded`.
    async fn insert(&self, batch: &Batch, account_budget: i64) -> Result<Batch, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Batch>, AppError>;

    /// The site's Active batch, if any. At most one can exist.
    async fn find_active_by_site(&self, site_id: Uuid) -> Result<Option<Batch>, AppError>;

    /// Count Active batches for an account. With `locked`, the count is taken
    /// under the account's serializing lock; without it the count is a
    /// fast-path read that may be stale by the time it is used.
    async fn count_active_by_account(&self, account_id: Uuid, locked: bool)
        -> Result<i64, AppError>;

    /// Persist a mutation under optimistic concurrency: the write succeeds
    /// only if the stored version still matches `batch.version`, and bumps
    /// the version by one. Returns the batch as persisted. A moved version
    /// yields `VersionConflict`; a missing row yields `NotFound`.
    async fn save(&self, batch: &Batch) -> Result<Batch, AppError>;

    /// Active batches started before `cutoff`, oldest first.
    async fn find_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<Batch>, AppError>;
}

/// Persistence for uploaded-file metadata.
#[async_trait]
pub trait UploadedFileStore: Send + Sync {
    /// Advisory pre-check for duplicate names; the unique constraint checked
    /// by `insert` is the real guard.
    async fn exists_by_batch_and_name(
        &self,
        batch_id: Uuid,
        original_name: &str,
    ) -> Result<bool, AppError>;

    /// Persist the record. A `(batch_id, original_name)` uniqueness violation
    /// maps to `DuplicateFileName`.
    async fn insert(&self, file: &UploadedFile) -> Result<UploadedFile, AppError>;
}
