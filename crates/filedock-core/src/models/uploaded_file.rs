//! Metadata record for one successfully stored file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checksum::FileChecksum;

/// Created exactly once per successful upload; immutable thereafter.
/// `(batch_id, original_name)` is unique within the metadata store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub batch_id: Uuid,
    /// File name as provided by the client.
    pub original_name: String,
    /// Full blob store key: batch storage location + original name.
    pub storage_key: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub checksum: FileChecksum,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(
        batch_id: Uuid,
        original_name: String,
        storage_key: String,
        size_bytes: i64,
        content_type: String,
        checksum: FileChecksum,
    ) -> Self {
        UploadedFile {
            id: Uuid::new_v4(),
            batch_id,
            original_name,
            storage_key,
            size_bytes,
            content_type,
            checksum,
            uploaded_at: Utc::now(),
        }
    }
}
