//! Timeout sweeper.
//!
//! Periodic job that expires Active batches older than the timeout window.
//! Each run is independent and idempotent: a version conflict on save means a
//! client-driven transition won the race and the batch is already terminal,
//! which is logged and skipped rather than surfaced. Any other per-batch
//! failure is recorded and the pass continues; overlapping runs from multiple
//! instances are safe under the same version guard.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;

use filedock_core::stores::BatchStore;
use filedock_core::{AppError, IngestConfig};

/// Per-run accounting, logged after each pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Overdue Active batches the pass looked at.
    pub examined: usize,
    /// Batches this run expired.
    pub expired: usize,
    /// Batches another writer terminated first (benign race).
    pub already_terminal: usize,
    /// Batches whose expiry failed for any other reason.
    pub failed: usize,
}

pub struct BatchSweeper {
    batch_store: Arc<dyn BatchStore>,
    timeout: Duration,
    sweep_interval: Duration,
}

impl BatchSweeper {
    pub fn new(batch_store: Arc<dyn BatchStore>, config: &IngestConfig) -> Self {
        Self {
            batch_store,
            timeout: config.batch_timeout,
            sweep_interval: config.sweep_interval,
        }
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(self.sweep_interval);

            loop {
                tick.tick().await;

                tracing::info!("Starting scheduled sweep of overdue batches");

                match self.sweep().await {
                    Ok(outcome) => {
                        tracing::info!(
                            examined = outcome.examined,
                            expired = outcome.expired,
                            already_terminal = outcome.already_terminal,
                            failed = outcome.failed,
                            "Sweep completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep failed");
                    }
                }
            }
        })
    }

    /// Expire every Active batch started before `now - timeout`.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<SweepOutcome, AppError> {
        let timeout = chrono::Duration::from_std(self.timeout)
            .map_err(|e| AppError::Internal(format!("Invalid sweep timeout: {}", e)))?;
        let cutoff = Utc::now() - timeout;

        let overdue = self.batch_store.find_expired(cutoff).await?;
        let mut outcome = SweepOutcome {
            examined: overdue.len(),
            ..Default::default()
        };

        for mut batch in overdue {
            let batch_id = batch.id;

            if batch.expire().is_err() {
                // find_expired returns Active rows, so a terminal status here
                // means the read raced another writer.
                outcome.already_terminal += 1;
                tracing::debug!(batch_id = %batch_id, "Batch no longer active, skipping");
                continue;
            }

            match self.batch_store.save(&batch).await {
                Ok(_) => {
                    outcome.expired += 1;
                    tracing::info!(
                        batch_id = %batch_id,
                        started_at = %batch.started_at,
                        "Expired overdue batch"
                    );
                }
                Err(AppError::VersionConflict { .. }) => {
                    outcome.already_terminal += 1;
                    tracing::debug!(
                        batch_id = %batch_id,
                        "Batch terminated by another writer, skipping"
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(error = %e, batch_id = %batch_id, "Failed to expire batch");
                }
            }
        }

        Ok(outcome)
    }
}
