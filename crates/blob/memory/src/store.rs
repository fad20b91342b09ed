use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use cairn_blob::error::BlobError;
use cairn_blob::store::BlobStore;
use cairn_core::UploadId;

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// `Bytes` clones are reference-counted, so reads do not copy content.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &UploadId, data: Bytes) -> Result<(), BlobError> {
        self.data.insert(key.as_str().to_owned(), data);
        Ok(())
    }

    async fn get(&self, key: &UploadId) -> Result<Bytes, BlobError> {
        self.data
            .get(key.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &UploadId) -> Result<bool, BlobError> {
        Ok(self.data.remove(key.as_str()).is_some())
    }
}
