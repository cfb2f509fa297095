//! Upload pipeline.
//!
//! Validates, checksums, and durably persists one file into an active batch.
//! Preconditions are checked in a fixed order, each with its own failure
//! kind, so a client can always tell which one failed. Batch counters move
//! only after the blob write is confirmed durable; a blob whose metadata
//! persist then fails is an accepted orphan and is never deleted here.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;
use validator::Validate;

use filedock_core::stores::{BatchStore, UploadedFileStore};
use filedock_core::{
    AppError, Batch, BatchStatus, IngestConfig, Sha256Hasher, UploadRequest, UploadedFile,
};
use filedock_storage::keys::file_storage_key;
use filedock_storage::Storage;

/// Chunk size used when feeding a buffered payload through the hasher.
const HASH_CHUNK_BYTES: usize = 64 * 1024;

/// Attempts for the counter update when concurrent uploads to the same batch
/// race on the version column.
const COUNTER_SAVE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct UploadService {
    batch_store: Arc<dyn BatchStore>,
    file_store: Arc<dyn UploadedFileStore>,
    storage: Arc<dyn Storage>,
    max_file_size_bytes: i64,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl UploadService {
    pub fn new(
        batch_store: Arc<dyn BatchStore>,
        file_store: Arc<dyn UploadedFileStore>,
        storage: Arc<dyn Storage>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            batch_store,
            file_store,
            storage,
            max_file_size_bytes: config.effective_max_file_size_bytes(),
            retry_attempts: config.storage_retry_attempts.max(1),
            retry_delay: config.storage_retry_delay,
        }
    }

    /// Store one file into an active batch and return its metadata record.
    #[tracing::instrument(
        skip(self, request, data),
        fields(batch_id = %batch_id, file_name = %request.file_name, size_bytes = request.size_bytes)
    )]
    pub async fn upload(
        &self,
        batch_id: Uuid,
        request: UploadRequest,
        data: Bytes,
    ) -> Result<UploadedFile, AppError> {
        let batch = self
            .batch_store
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;

        if batch.status != BatchStatus::Active {
            return Err(AppError::NotAcceptingUploads {
                batch_id,
                status: batch.status,
            });
        }

        if request.size_bytes > self.max_file_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds the {} byte limit",
                request.size_bytes, self.max_file_size_bytes
            )));
        }

        request.validate()?;

        if data.len() as i64 != request.size_bytes {
            return Err(AppError::InvalidInput(format!(
                "Declared size {} does not match payload size {}",
                request.size_bytes,
                data.len()
            )));
        }

        // Advisory duplicate pre-check; the metadata store's unique
        // constraint remains the final guard under concurrency.
        if self
            .file_store
            .exists_by_batch_and_name(batch_id, &request.file_name)
            .await?
        {
            return Err(AppError::DuplicateFileName {
                batch_id,
                file_name: request.file_name,
            });
        }

        // Checksum before the write so a retried write never needs the
        // client's stream a second time.
        let mut hasher = Sha256Hasher::new();
        for chunk in data.chunks(HASH_CHUNK_BYTES) {
            hasher.update(chunk);
        }
        let checksum = hasher.finalize();

        let storage_key = file_storage_key(&batch.storage_location, &request.file_name);
        self.put_with_retry(&storage_key, &request.content_type, data)
            .await?;

        let record = UploadedFile::new(
            batch_id,
            request.file_name,
            storage_key,
            request.size_bytes,
            request.content_type,
            checksum,
        );
        let record = self.file_store.insert(&record).await?;

        self.record_on_batch(batch, record.size_bytes).await?;

        tracing::info!(
            file_id = %record.id,
            storage_key = %record.storage_key,
            checksum = %record.checksum,
            "Stored uploaded file"
        );

        Ok(record)
    }

    /// Blob write with bounded retry: fixed delay between attempts, then the
    /// storage failure surfaces to the caller and is never retried again here.
    async fn put_with_retry(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), AppError> {
        let mut last_err = String::new();
        for attempt in 1..=self.retry_attempts {
            match self
                .storage
                .put(storage_key, content_type, data.clone())
                .await
            {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(storage_key = %storage_key, attempt, "Blob write succeeded after retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        storage_key = %storage_key,
                        attempt,
                        max_attempts = self.retry_attempts,
                        "Blob write failed"
                    );
                    last_err = e.to_string();
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(AppError::Storage(last_err))
    }

    /// Bump the batch counters under optimistic concurrency, re-reading on a
    /// version conflict with a concurrent upload to the same batch.
    async fn record_on_batch(&self, mut batch: Batch, size_bytes: i64) -> Result<(), AppError> {
        let batch_id = batch.id;
        let mut attempt = 0;
        loop {
            attempt += 1;
            batch.record_upload(size_bytes)?;
            match self.batch_store.save(&batch).await {
                Ok(_) => return Ok(()),
                Err(AppError::VersionConflict { .. }) if attempt < COUNTER_SAVE_ATTEMPTS => {
                    batch = self
                        .batch_store
                        .find_by_id(batch_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
