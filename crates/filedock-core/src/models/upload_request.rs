//! Upload request value object.

use serde::Deserialize;
use validator::Validate;

/// Parameters for uploading one file into an active batch. The payload bytes
/// travel separately; this carries the client-declared attributes, validated
/// before the pipeline runs.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadRequest {
    /// Original filename, unique within the batch.
    #[validate(length(
        min = 1,
        max = 255,
        message = "File name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Declared file size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size_bytes: i64,
}
