//! Postgres batch store.
//!
//! Admission and lifecycle writes funnel through two storage-layer guards:
//! a partial unique index (`site_id` where status = 'active') that makes
//! one-active-batch-per-site hold under concurrent inserts, and a version
//! column compared-and-swapped on every update so a sweeper expiry and a
//! client transition can race safely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use filedock_core::stores::BatchStore;
use filedock_core::{AppError, Batch};

use super::is_unique_violation;

#[derive(Clone)]
pub struct PgBatchStore {
    pool: PgPool,
}

impl PgBatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn batch_from_row(row: &PgRow) -> Result<Batch, sqlx::Error> {
    Ok(Batch {
        id: row.get("id"),
        account_id: row.get("account_id"),
        site_id: row.get("site_id"),
        status: row.get::<String, _>("status").parse().map_err(|e| {
            sqlx::Error::Decode(format!("Failed to parse batch status: {}", e).into())
        })?,
        storage_location: row.get("storage_location"),
        uploaded_file_count: row.get("uploaded_file_count"),
        total_bytes: row.get("total_bytes"),
        has_errors: row.get("has_errors"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        version: row.get("version"),
    })
}

const SELECT_BATCH: &str = r#"
    SELECT id, account_id, site_id, status, storage_location,
           uploaded_file_count, total_bytes, has_errors,
           started_at, completed_at, version
    FROM batches
"#;

#[async_trait]
impl BatchStore for PgBatchStore {
    async fn insert(&self, batch: &Batch, account_budget: i64) -> Result<Batch, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent admission checks for this account. The lock is
        // transaction-scoped: released on commit or rollback, so the count
        // below cannot interleave with another in-flight admission for the
        // same account.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(batch.account_id)
            .execute(&mut *tx)
            .await?;

        let active: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM batches
            WHERE account_id = $1 AND status = 'active'
            "#,
        )
        .bind(batch.account_id)
        .fetch_one(&mut *tx)
        .await?;

        if active >= account_budget {
            return Err(AppError::ConcurrencyLimitExceeded {
                account_id: batch.account_id,
                active,
                limit: account_budget,
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO batches (
                id, account_id, site_id, status, storage_location,
                uploaded_file_count, total_bytes, has_errors,
                started_at, completed_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(batch.id)
        .bind(batch.account_id)
        .bind(batch.site_id)
        .bind(batch.status.to_string())
        .bind(&batch.storage_location)
        .bind(batch.uploaded_file_count)
        .bind(batch.total_bytes)
        .bind(batch.has_errors)
        .bind(batch.started_at)
        .bind(batch.completed_at)
        .bind(batch.version)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            // The partial unique index (one Active batch per site) is the
            // final arbiter for racing admissions.
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::ActiveBatchExists {
                    site_id: batch.site_id,
                });
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        tracing::debug!(
            batch_id = %batch.id,
            site_id = %batch.site_id,
            account_id = %batch.account_id,
            "Inserted new active batch"
        );

        Ok(batch.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Batch>, AppError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_BATCH))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(batch_from_row).transpose().map_err(Into::into)
    }

    async fn find_active_by_site(&self, site_id: Uuid) -> Result<Option<Batch>, AppError> {
        let row = sqlx::query(&format!(
            "{} WHERE site_id = $1 AND status = 'active'",
            SELECT_BATCH
        ))
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(batch_from_row).transpose().map_err(Into::into)
    }

    async fn count_active_by_account(
        &self,
        account_id: Uuid,
        locked: bool,
    ) -> Result<i64, AppError> {
        if locked {
            // Take the account's admission lock so the count cannot observe a
            // half-finished admission.
            let mut tx = self.pool.begin().await?;
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
                .bind(account_id)
                .execute(&mut *tx)
                .await?;
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM batches WHERE account_id = $1 AND status = 'active'",
            )
            .bind(account_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(count)
        } else {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM batches WHERE account_id = $1 AND status = 'active'",
            )
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(count)
        }
    }

    async fn save(&self, batch: &Batch) -> Result<Batch, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE batches
            SET status = $3,
                uploaded_file_count = $4,
                total_bytes = $5,
                has_errors = $6,
                completed_at = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(batch.id)
        .bind(batch.version)
        .bind(batch.status.to_string())
        .bind(batch.uploaded_file_count)
        .bind(batch.total_bytes)
        .bind(batch.has_errors)
        .bind(batch.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM batches WHERE id = $1)")
                    .bind(batch.id)
                    .fetch_one(&self.pool)
                    .await?;
            if exists {
                return Err(AppError::VersionConflict { batch_id: batch.id });
            }
            return Err(AppError::NotFound(format!("Batch {}", batch.id)));
        }

        let mut saved = batch.clone();
        saved.version = batch.version + 1;
        Ok(saved)
    }

    async fn find_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<Batch>, AppError> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'active' AND started_at < $1 ORDER BY started_at",
            SELECT_BATCH
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(batch_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}
