use thiserror::Error;

use cairn_core::{CoreError, UploadId};

/// Errors returned by [`UploadService`](crate::UploadService) operations.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The content was already uploaded under this identifier.
    ///
    /// An expected outcome of the dedup path, not a fault.
    #[error("upload already exists: {0}")]
    AlreadyExists(UploadId),

    /// No upload is reachable under the identifier.
    #[error("upload not found: {0}")]
    NotFound(String),

    /// The caller supplied a malformed identifier or content type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The metadata store failed.
    #[error("metadata error: {0}")]
    Metadata(#[from] cairn_metadata::MetadataError),

    /// The blob store failed.
    #[error("blob error: {0}")]
    Blob(#[from] cairn_blob::BlobError),

    /// The service was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<CoreError> for UploadError {
    fn from(e: CoreError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl UploadError {
    /// Whether this error is a storage fault rather than an expected outcome.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Metadata(_) | Self::Blob(_))
    }
}
