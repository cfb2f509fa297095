//! Shared constants and defaults.

/// Default per-file size limit enforced at the API boundary (128 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: i64 = 128 * 1024 * 1024;

/// Hard per-file ceiling (500 MiB). The effective limit for an upload is the
/// smaller of this and the configured limit.
pub const HARD_MAX_FILE_SIZE_BYTES: i64 = 500 * 1024 * 1024;

/// Default number of simultaneously active batches allowed per account.
pub const DEFAULT_MAX_ACTIVE_BATCHES_PER_ACCOUNT: i64 = 5;

/// Default batch inactivity timeout in seconds (60 minutes). Active batches
/// older than this are expired by the sweeper.
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 60 * 60;

/// Default interval in seconds between sweeper runs (5 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Default number of attempts for a blob store write.
pub const DEFAULT_STORAGE_RETRY_ATTEMPTS: u32 = 3;

/// Default fixed delay in milliseconds between blob store write attempts.
pub const DEFAULT_STORAGE_RETRY_DELAY_MS: u64 = 500;

/// Maximum accepted length of an uploaded file name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;
