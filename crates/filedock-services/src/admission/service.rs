//! Batch admission control.
//!
//! Decides whether a new batch may start for a site, and applies
//! client-driven terminal transitions. The service's own checks are fast-path
//! optimizations; the batch store re-checks both admission rules atomically
//! with the insert (partial unique index for one-Active-per-site, serialized
//! count for the account budget), so racing requests cannot overshoot.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use filedock_core::stores::BatchStore;
use filedock_core::{AppError, Batch, IngestConfig};
use filedock_storage::keys::batch_storage_location;

#[derive(Clone)]
pub struct AdmissionService {
    batch_store: Arc<dyn BatchStore>,
    max_active_batches_per_account: i64,
}

impl AdmissionService {
    pub fn new(batch_store: Arc<dyn BatchStore>, config: &IngestConfig) -> Self {
        Self {
            batch_store,
            max_active_batches_per_account: config.max_active_batches_per_account,
        }
    }

    /// Admit and persist a new Active batch for the site.
    #[tracing::instrument(skip(self), fields(account_id = %account_id, site_id = %site_id))]
    pub async fn start_batch(
        &self,
        account_id: Uuid,
        site_id: Uuid,
        domain: &str,
    ) -> Result<Batch, AppError> {
        if domain.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Site domain must not be empty".to_string(),
            ));
        }

        // An existing Active batch blocks admission even when it has already
        // outlived the timeout window: expiry belongs to the sweeper alone,
        // so the site stays blocked until the sweeper has run.
        if let Some(existing) = self.batch_store.find_active_by_site(site_id).await? {
            tracing::debug!(
                existing_batch_id = %existing.id,
                "Admission rejected: active batch exists for site"
            );
            return Err(AppError::ActiveBatchExists { site_id });
        }

        // Fast-path budget check; may be stale, the insert below re-counts
        // under the account's serializing lock.
        let active = self
            .batch_store
            .count_active_by_account(account_id, false)
            .await?;
        if active >= self.max_active_batches_per_account {
            return Err(AppError::ConcurrencyLimitExceeded {
                account_id,
                active,
                limit: self.max_active_batches_per_account,
            });
        }

        let started_at = Utc::now();
        let storage_location = batch_storage_location(account_id, domain, started_at);
        let batch = Batch::start(account_id, site_id, storage_location, started_at);

        let batch = self
            .batch_store
            .insert(&batch, self.max_active_batches_per_account)
            .await?;

        tracing::info!(
            batch_id = %batch.id,
            storage_location = %batch.storage_location,
            "Started new batch"
        );

        Ok(batch)
    }

    /// Client-driven successful termination.
    pub async fn complete_batch(&self, batch_id: Uuid) -> Result<Batch, AppError> {
        self.transition(batch_id, Batch::complete).await
    }

    /// Client- or error-path termination.
    pub async fn fail_batch(&self, batch_id: Uuid) -> Result<Batch, AppError> {
        self.transition(batch_id, Batch::fail).await
    }

    /// Client-driven abort. Already-written blobs are kept.
    pub async fn cancel_batch(&self, batch_id: Uuid) -> Result<Batch, AppError> {
        self.transition(batch_id, Batch::cancel).await
    }

    async fn transition(
        &self,
        batch_id: Uuid,
        apply: fn(&mut Batch) -> Result<(), AppError>,
    ) -> Result<Batch, AppError> {
        let mut batch = self
            .batch_store
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;

        apply(&mut batch)?;

        let saved = self.batch_store.save(&batch).await?;
        tracing::info!(
            batch_id = %saved.id,
            status = %saved.status,
            "Batch terminated"
        );
        Ok(saved)
    }
}
