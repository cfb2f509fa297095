//! Error attachment hook.
//!
//! Invoked by the external error-logging collaborator after it persists an
//! error tied to a batch. Idempotently flips the batch's error flag,
//! regardless of status: errors may arrive for batches that have already
//! terminated, e.g. one reported just as the batch times out.

use std::sync::Arc;

use uuid::Uuid;

use filedock_core::stores::BatchStore;
use filedock_core::AppError;

const SAVE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct ErrorAttachmentHook {
    batch_store: Arc<dyn BatchStore>,
}

impl ErrorAttachmentHook {
    pub fn new(batch_store: Arc<dyn BatchStore>) -> Self {
        Self { batch_store }
    }

    /// Set `has_errors` on the batch. Re-reads and retries on a version
    /// conflict, since the flag may race the sweeper or a client transition.
    #[tracing::instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn on_error_recorded(&self, batch_id: Uuid) -> Result<(), AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut batch = self
                .batch_store
                .find_by_id(batch_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;

            if !batch.mark_has_errors() {
                return Ok(());
            }

            match self.batch_store.save(&batch).await {
                Ok(_) => {
                    tracing::info!("Flagged batch as having errors");
                    return Ok(());
                }
                Err(AppError::VersionConflict { .. }) if attempt < SAVE_ATTEMPTS => {
                    tracing::debug!(attempt, "Version conflict while flagging errors, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
