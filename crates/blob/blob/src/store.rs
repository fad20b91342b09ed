use async_trait::async_trait;
use bytes::Bytes;

use cairn_core::UploadId;

use crate::error::BlobError;

/// Pluggable byte storage for upload content, keyed by upload identifier.
///
/// Implementors provide the actual storage mechanism (filesystem, memory,
/// object storage). A `put` for a key that already holds the same bytes must
/// be harmless, since identical content always maps to the same key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous content.
    async fn put(&self, key: &UploadId, data: Bytes) -> Result<(), BlobError>;

    /// Retrieve the content stored under `key`.
    ///
    /// Returns [`BlobError::NotFound`] if nothing is stored under the key.
    async fn get(&self, key: &UploadId) -> Result<Bytes, BlobError>;

    /// Delete the content under `key`. Returns `true` if it existed.
    async fn delete(&self, key: &UploadId) -> Result<bool, BlobError>;
}
