//! Postgres uploaded-file metadata store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filedock_core::stores::UploadedFileStore;
use filedock_core::{AppError, UploadedFile};

use super::is_unique_violation;

#[derive(Clone)]
pub struct PgUploadedFileStore {
    pool: PgPool,
}

impl PgUploadedFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadedFileStore for PgUploadedFileStore {
    async fn exists_by_batch_and_name(
        &self,
        batch_id: Uuid,
        original_name: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM uploaded_files
                WHERE batch_id = $1 AND original_name = $2
            )
            "#,
        )
        .bind(batch_id)
        .bind(original_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, file: &UploadedFile) -> Result<UploadedFile, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO uploaded_files (
                id, batch_id, original_name, storage_key, size_bytes,
                content_type, checksum_algorithm, checksum_hex, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(file.id)
        .bind(file.batch_id)
        .bind(&file.original_name)
        .bind(&file.storage_key)
        .bind(file.size_bytes)
        .bind(&file.content_type)
        .bind(file.checksum.algorithm.to_string())
        .bind(&file.checksum.hex_digest)
        .bind(file.uploaded_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(file.clone()),
            // The (batch_id, original_name) unique constraint is the
            // authoritative duplicate guard; the service pre-check is only an
            // optimization.
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateFileName {
                batch_id: file.batch_id,
                file_name: file.original_name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
