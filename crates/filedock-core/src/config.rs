//! Configuration module
//!
//! Environment-driven configuration for the ingest engine: admission limits,
//! timeout windows, storage retry policy, and backend selection.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BATCH_TIMEOUT_SECS, DEFAULT_MAX_ACTIVE_BATCHES_PER_ACCOUNT,
    DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_STORAGE_RETRY_ATTEMPTS, DEFAULT_STORAGE_RETRY_DELAY_MS,
    DEFAULT_SWEEP_INTERVAL_SECS, HARD_MAX_FILE_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

/// Ingest engine configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub database_url: String,
    /// Per-file size limit enforced at the API boundary.
    pub max_file_size_bytes: i64,
    /// Simultaneously active batches allowed per account.
    pub max_active_batches_per_account: i64,
    /// How long a batch may stay Active before the sweeper expires it.
    pub batch_timeout: Duration,
    /// How often the sweeper runs.
    pub sweep_interval: Duration,
    /// Blob write retry policy: total attempts and fixed delay between them.
    pub storage_retry_attempts: u32,
    pub storage_retry_delay: Duration,
    // Storage backend configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
}

impl IngestConfig {
    /// Load configuration from the environment, with defaults for everything
    /// except `DATABASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        Ok(IngestConfig {
            database_url,
            max_file_size_bytes: env_parse("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES),
            max_active_batches_per_account: env_parse(
                "MAX_ACTIVE_BATCHES_PER_ACCOUNT",
                DEFAULT_MAX_ACTIVE_BATCHES_PER_ACCOUNT,
            ),
            batch_timeout: Duration::from_secs(env_parse(
                "BATCH_TIMEOUT_SECS",
                DEFAULT_BATCH_TIMEOUT_SECS,
            )),
            sweep_interval: Duration::from_secs(env_parse(
                "SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            storage_retry_attempts: env_parse(
                "STORAGE_RETRY_ATTEMPTS",
                DEFAULT_STORAGE_RETRY_ATTEMPTS,
            ),
            storage_retry_delay: Duration::from_millis(env_parse(
                "STORAGE_RETRY_DELAY_MS",
                DEFAULT_STORAGE_RETRY_DELAY_MS,
            )),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .ok()
                .or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
        })
    }

    /// The smaller of the configured limit and the hard ceiling governs.
    pub fn effective_max_file_size_bytes(&self) -> i64 {
        self.max_file_size_bytes.min(HARD_MAX_FILE_SIZE_BYTES)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            database_url: String::new(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_active_batches_per_account: DEFAULT_MAX_ACTIVE_BATCHES_PER_ACCOUNT,
            batch_timeout: Duration::from_secs(DEFAULT_BATCH_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            storage_retry_attempts: DEFAULT_STORAGE_RETRY_ATTEMPTS,
            storage_retry_delay: Duration::from_millis(DEFAULT_STORAGE_RETRY_DELAY_MS),
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
