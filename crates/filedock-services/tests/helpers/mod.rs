#![allow(dead_code)]

//! In-memory doubles for the service tests.
//!
//! These enforce the same semantics as the Postgres stores: admission checks
//! atomic with the insert, version compare-and-swap on save, and the
//! `(batch_id, original_name)` unique guard.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use filedock_core::stores::{BatchStore, UploadedFileStore};
use filedock_core::{AppError, Batch, BatchStatus, IngestConfig, StorageBackend, UploadedFile};
use filedock_storage::{Storage, StorageError, StorageResult};

/// Default config with a negligible retry delay so tests stay fast.
pub fn test_config() -> IngestConfig {
    init_tracing();
    IngestConfig {
        storage_retry_delay: Duration::from_millis(1),
        ..IngestConfig::default()
    }
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct InMemoryBatchStore {
    batches: Mutex<HashMap<Uuid, Batch>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a batch directly, bypassing admission checks (test setup only).
    pub fn seed(&self, batch: Batch) {
        self.batches.lock().unwrap().insert(batch.id, batch);
    }

    pub fn get(&self, id: Uuid) -> Option<Batch> {
        self.batches.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn insert(&self, batch: &Batch, account_budget: i64) -> Result<Batch, AppError> {
        let mut map = self.batches.lock().unwrap();

        if map
            .values()
            .any(|b| b.site_id == batch.site_id && b.status == BatchStatus::Active)
        {
            return Err(AppError::ActiveBatchExists {
                site_id: batch.site_id,
            });
        }

        let active = map
            .values()
            .filter(|b| b.account_id == batch.account_id && b.status == BatchStatus::Active)
            .count() as i64;
        if active >= account_budget {
            return Err(AppError::ConcurrencyLimitExceeded {
                account_id: batch.account_id,
                active,
                limit: account_budget,
            });
        }

        map.insert(batch.id, batch.clone());
        Ok(batch.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Batch>, AppError> {
        Ok(self.batches.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_by_site(&self, site_id: Uuid) -> Result<Option<Batch>, AppError> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .values()
            .find(|b| b.site_id == site_id && b.status == BatchStatus::Active)
            .cloned())
    }

    async fn count_active_by_account(
        &self,
        account_id: Uuid,
        _locked: bool,
    ) -> Result<i64, AppError> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.account_id == account_id && b.status == BatchStatus::Active)
            .count() as i64)
    }

    async fn save(&self, batch: &Batch) -> Result<Batch, AppError> {
        let mut map = self.batches.lock().unwrap();
        let stored = map
            .get(&batch.id)
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch.id)))?;

        if stored.version != batch.version {
            return Err(AppError::VersionConflict { batch_id: batch.id });
        }

        let mut saved = batch.clone();
        saved.version = batch.version + 1;
        map.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<Batch>, AppError> {
        let mut overdue: Vec<Batch> = self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.status == BatchStatus::Active && b.started_at < cutoff)
            .cloned()
            .collect();
        overdue.sort_by_key(|b| b.started_at);
        Ok(overdue)
    }
}

/// Wrapper that serves a preset (possibly stale) answer from `find_expired`,
/// to reproduce the sweeper racing a client-driven transition.
pub struct StaleReadBatchStore {
    pub inner: Arc<InMemoryBatchStore>,
    pub stale_expired: Mutex<Vec<Batch>>,
}

impl StaleReadBatchStore {
    pub fn new(inner: Arc<InMemoryBatchStore>, stale_expired: Vec<Batch>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            stale_expired: Mutex::new(stale_expired),
        })
    }
}

#[async_trait]
impl BatchStore for StaleReadBatchStore {
    async fn insert(&self, batch: &Batch, account_budget: i64) -> Result<Batch, AppError> {
        self.inner.insert(batch, account_budget).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Batch>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_active_by_site(&self, site_id: Uuid) -> Result<Option<Batch>, AppError> {
        self.inner.find_active_by_site(site_id).await
    }

    async fn count_active_by_account(
        &self,
        account_id: Uuid,
        locked: bool,
    ) -> Result<i64, AppError> {
        self.inner.count_active_by_account(account_id, locked).await
    }

    async fn save(&self, batch: &Batch) -> Result<Batch, AppError> {
        self.inner.save(batch).await
    }

    async fn find_expired(&self, _cutoff: DateTime<Utc>) -> Result<Vec<Batch>, AppError> {
        Ok(self.stale_expired.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct InMemoryUploadedFileStore {
    files: Mutex<HashMap<(Uuid, String), UploadedFile>>,
}

impl InMemoryUploadedFileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadedFileStore for InMemoryUploadedFileStore {
    async fn exists_by_batch_and_name(
        &self,
        batch_id: Uuid,
        original_name: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .contains_key(&(batch_id, original_name.to_string())))
    }

    async fn insert(&self, file: &UploadedFile) -> Result<UploadedFile, AppError> {
        let mut map = self.files.lock().unwrap();
        let key = (file.batch_id, file.original_name.clone());
        if map.contains_key(&key) {
            return Err(AppError::DuplicateFileName {
                batch_id: file.batch_id,
                file_name: file.original_name.clone(),
            });
        }
        map.insert(key, file.clone());
        Ok(file.clone())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, storage_key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .map(|b| b.len() as u64)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Storage that fails the first `failures` put calls, then delegates to an
/// in-memory backend.
pub struct FlakyStorage {
    pub inner: Arc<MemoryStorage>,
    failures_remaining: AtomicU32,
    pub put_calls: AtomicU32,
}

impl FlakyStorage {
    pub fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::new(),
            failures_remaining: AtomicU32::new(failures),
            put_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(&self, storage_key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }
        self.inner.put(storage_key, content_type, data).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.inner.content_length(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
