//! Batch entity and lifecycle state machine.
//!
//! A batch is one bounded upload session for a site. It starts `Active` and
//! moves to exactly one terminal status (`Completed`, `Failed`, `Cancelled`,
//! `Expired`). No transition is legal out of a terminal status, and
//! `Active -> Active` is rejected so a double-start can never be silently
//! accepted. All persisted mutations go through the `version` counter for
//! optimistic concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Active,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl BatchStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Active)
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BatchStatus::Active => write!(f, "active"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
            BatchStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BatchStatus::Active),
            "completed" => Ok(BatchStatus::Completed),
            "failed" => Ok(BatchStatus::Failed),
            "cancelled" => Ok(BatchStatus::Cancelled),
            "expired" => Ok(BatchStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid batch status: {}", s)),
        }
    }
}

/// One upload session for a site, bound to a single storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    /// Billing/quota tenant that owns the site.
    pub account_id: Uuid,
    /// Uploading tenant. At most one Active batch may exist per site.
    pub site_id: Uuid,
    pub status: BatchStatus,
    /// Write prefix for all files in this batch, derived from account,
    /// site domain and start time truncated to the minute.
    pub storage_location: String,
    pub uploaded_file_count: i64,
    pub total_bytes: i64,
    /// Set-once error flag; never reset to false.
    pub has_errors: bool,
    pub started_at: DateTime<Utc>,
    /// Some iff status is terminal.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter, bumped on every persisted mutation.
    pub version: i64,
}

impl Batch {
    /// Create a new Active batch at version 0 with zeroed counters.
    pub fn start(
        account_id: Uuid,
        site_id: Uuid,
        storage_location: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Batch {
            id: Uuid::new_v4(),
            account_id,
            site_id,
            status: BatchStatus::Active,
            storage_location,
            uploaded_file_count: 0,
            total_bytes: 0,
            has_errors: false,
            started_at,
            completed_at: None,
            version: 0,
        }
    }

    /// Whether the sweeper should expire this batch given the timeout window.
    pub fn is_overdue(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.status == BatchStatus::Active && now >= self.started_at + timeout
    }

    fn transition_to(&mut self, next: BatchStatus) -> Result<(), AppError> {
        // Active -> Active and terminal -> anything (including itself) are
        // both illegal; the caller gets a distinguishable conflict.
        if self.status.is_terminal() || next == BatchStatus::Active {
            return Err(AppError::InvalidStateTransition {
                batch_id: self.id,
                from: self.status,
                attempted: next,
            });
        }
        self.status = next;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Client-driven successful termination.
    pub fn complete(&mut self) -> Result<(), AppError> {
        self.transition_to(BatchStatus::Completed)
    }

    /// Client- or error-path termination; also flags the batch as errored.
    pub fn fail(&mut self) -> Result<(), AppError> {
        self.transition_to(BatchStatus::Failed)?;
        self.has_errors = true;
        Ok(())
    }

    /// Client-driven abort. Files already written to the blob store are kept.
    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.transition_to(BatchStatus::Cancelled)
    }

    /// Timeout-driven termination. Used exclusively by the sweeper.
    pub fn expire(&mut self) -> Result<(), AppError> {
        self.transition_to(BatchStatus::Expired)
    }

    /// Account one successfully stored file. Legal only while Active.
    pub fn record_upload(&mut self, bytes: i64) -> Result<(), AppError> {
        if self.status != BatchStatus::Active {
            return Err(AppError::NotAcceptingUploads {
                batch_id: self.id,
                status: self.status,
            });
        }
        self.uploaded_file_count += 1;
        self.total_bytes += bytes;
        Ok(())
    }

    /// Idempotently flag the batch as having attached errors. Legal in any
    /// status; errors may arrive after termination. Returns whether the flag
    /// changed so callers can skip a useless persist.
    pub fn mark_has_errors(&mut self) -> bool {
        if self.has_errors {
            return false;
        }
        self.has_errors = true;
        true
    }
}
