use std::sync::Arc;

use cairn_blob::BlobStore;
use cairn_core::{HashingIdDeriver, IdDeriver};
use cairn_metadata::MetadataStore;

use crate::error::UploadError;
use crate::metrics::UploadMetrics;
use crate::service::UploadService;

/// Fluent builder for constructing an [`UploadService`].
///
/// A [`MetadataStore`] and a [`BlobStore`] must be supplied. The deriver
/// defaults to [`HashingIdDeriver`] with the default seed.
#[derive(Default)]
pub struct UploadServiceBuilder {
    deriver: Option<Arc<dyn IdDeriver>>,
    metadata: Option<Arc<dyn MetadataStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl UploadServiceBuilder {
    /// Create a new builder with no stores configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier deriver.
    #[must_use]
    pub fn deriver(mut self, deriver: Arc<dyn IdDeriver>) -> Self {
        self.deriver = Some(deriver);
        self
    }

    /// Set the metadata store implementation.
    #[must_use]
    pub fn metadata(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    /// Set the blob store implementation.
    #[must_use]
    pub fn blobs(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(store);
        self
    }

    /// Consume the builder and produce a configured [`UploadService`].
    ///
    /// Returns [`UploadError::Configuration`] if either store is missing.
    pub fn build(self) -> Result<UploadService, UploadError> {
        let metadata = self
            .metadata
            .ok_or_else(|| UploadError::Configuration("metadata store is required".into()))?;

        let blobs = self
            .blobs
            .ok_or_else(|| UploadError::Configuration("blob store is required".into()))?;

        let deriver = self
            .deriver
            .unwrap_or_else(|| Arc::new(HashingIdDeriver::default()));

        Ok(UploadService {
            deriver,
            metadata,
            blobs,
            metrics: Arc::new(UploadMetrics::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use cairn_blob_memory::MemoryBlobStore;
    use cairn_metadata_memory::MemoryMetadataStore;

    use super::*;

    #[test]
    fn build_requires_metadata_store() {
        let result = UploadServiceBuilder::new()
            .blobs(Arc::new(MemoryBlobStore::new()))
            .build();
        assert!(matches!(result, Err(UploadError::Configuration(msg)) if msg.contains("metadata")));
    }

    #[test]
    fn build_requires_blob_store() {
        let result = UploadServiceBuilder::new()
            .metadata(Arc::new(MemoryMetadataStore::new()))
            .build();
        assert!(matches!(result, Err(UploadError::Configuration(msg)) if msg.contains("blob")));
    }

    #[test]
    fn deriver_defaults_to_hashing() {
        let service = UploadServiceBuilder::new()
            .metadata(Arc::new(MemoryMetadataStore::new()))
            .blobs(Arc::new(MemoryBlobStore::new()))
            .build()
            .unwrap();
        assert!(service.is_content_addressed());
        assert_eq!(
            service.get_id_for_content(b"abc"),
            HashingIdDeriver::default().derive(b"abc")
        );
    }
}
