//! Domain models.

pub mod batch;
pub mod upload_request;
pub mod uploaded_file;

pub use batch::{Batch, BatchStatus};
pub use upload_request::UploadRequest;
pub use uploaded_file::UploadedFile;
