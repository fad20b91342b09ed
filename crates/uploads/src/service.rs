use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use cairn_blob::{BlobError, BlobStore};
use cairn_core::{ContentType, IdDeriver, NewUpload, UploadId};
use cairn_metadata::{InsertOutcome, MetadataError, MetadataStore};

use crate::error::UploadError;
use crate::metrics::UploadMetrics;

/// Page size used when the caller does not give one.
pub const DEFAULT_LIST_LIMIT: u64 = 10;

/// Largest page [`UploadService::list_uploads`] will return.
pub const MAX_LIST_LIMIT: u64 = 100;

/// Content and content type of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub content: Bytes,
    pub content_type: ContentType,
}

/// Orchestrates identifier derivation, metadata registration and blob storage.
///
/// Construct through [`UploadServiceBuilder`](crate::UploadServiceBuilder).
/// The service is cheap to share behind an `Arc` and holds no locks of its
/// own; duplicate detection rests entirely on the metadata store's
/// insert-if-absent.
pub struct UploadService {
    pub(crate) deriver: Arc<dyn IdDeriver>,
    pub(crate) metadata: Arc<dyn MetadataStore>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) metrics: Arc<UploadMetrics>,
}

impl UploadService {
    /// Store `content` and return its identifier.
    ///
    /// Returns [`UploadError::AlreadyExists`] carrying the identifier when
    /// the content is already stored. With an opaque deriver a taken id is
    /// reported as a metadata fault instead. Only the caller that wins the metadata
    /// insert writes the blob; if that write fails the record is removed
    /// again so a retry can succeed.
    pub async fn add_upload(&self, content: Bytes, content_type: &str) -> Result<UploadId, UploadError> {
        let content_type = ContentType::parse(content_type)?;
        let upload_id = self.deriver.derive(&content);

        let outcome = self
            .metadata
            .insert(NewUpload::now(upload_id.clone(), content_type))
            .await
            .inspect_err(|e| {
                self.metrics.increment_failed();
                error!(upload_id = %upload_id, error = %e, "metadata insert failed");
            })?;

        if outcome == InsertOutcome::DuplicateKey {
            // An opaque id says nothing about content, so a taken one is a
            // collision with some other upload, never a duplicate.
            if !self.deriver.is_content_addressed() {
                self.metrics.increment_failed();
                error!(upload_id = %upload_id, "derived id collides with an existing upload");
                return Err(MetadataError::Backend(format!("id collision on {upload_id}")).into());
            }
            self.metrics.increment_duplicates();
            debug!(upload_id = %upload_id, "upload already exists");
            return Err(UploadError::AlreadyExists(upload_id));
        }

        let size = content.len();
        if let Err(e) = self.blobs.put(&upload_id, content).await {
            self.metrics.increment_failed();
            error!(upload_id = %upload_id, error = %e, "blob write failed, removing record");
            if let Err(cleanup) = self.metadata.delete(&upload_id).await {
                warn!(upload_id = %upload_id, error = %cleanup, "failed to remove record after blob write failure");
            }
            return Err(e.into());
        }

        // The record can only be gone here if a concurrent delete removed it.
        if self.metadata.find_by_id(&upload_id).await?.is_none() {
            self.metrics.increment_failed();
            error!(upload_id = %upload_id, "record vanished after blob write");
            return Err(MetadataError::Backend(format!(
                "record for {upload_id} vanished after blob write"
            ))
            .into());
        }

        self.metrics.increment_created();
        info!(upload_id = %upload_id, size, "upload created");
        Ok(upload_id)
    }

    /// Fetch the content and content type stored under `upload_id`.
    ///
    /// A record whose blob is missing is reported as
    /// [`UploadError::NotFound`], same as an unknown identifier.
    pub async fn get_upload(&self, upload_id: &str) -> Result<StoredUpload, UploadError> {
        let upload_id = UploadId::parse(upload_id)?;

        let Some(record) = self.metadata.find_by_id(&upload_id).await? else {
            self.metrics.increment_not_found();
            debug!(upload_id = %upload_id, "upload not found");
            return Err(UploadError::NotFound(upload_id.into_inner()));
        };

        match self.blobs.get(&upload_id).await {
            Ok(content) => {
                self.metrics.increment_served();
                Ok(StoredUpload {
                    content,
                    content_type: record.content_type,
                })
            }
            Err(BlobError::NotFound(_)) => {
                self.metrics.increment_not_found();
                error!(upload_id = %upload_id, "record present but blob missing");
                Err(UploadError::NotFound(upload_id.into_inner()))
            }
            Err(e) => {
                self.metrics.increment_failed();
                error!(upload_id = %upload_id, error = %e, "blob read failed");
                Err(e.into())
            }
        }
    }

    /// Remove the upload stored under `upload_id`.
    ///
    /// The record goes first, which makes the upload unreachable; the blob
    /// delete after it is best effort.
    pub async fn delete_upload(&self, upload_id: &str) -> Result<(), UploadError> {
        let upload_id = UploadId::parse(upload_id)?;

        if !self.metadata.delete(&upload_id).await? {
            self.metrics.increment_not_found();
            debug!(upload_id = %upload_id, "delete of unknown upload");
            return Err(UploadError::NotFound(upload_id.into_inner()));
        }

        match self.blobs.delete(&upload_id).await {
            Ok(true) => {}
            Ok(false) => warn!(upload_id = %upload_id, "deleted record had no blob"),
            Err(e) => warn!(upload_id = %upload_id, error = %e, "blob delete failed"),
        }

        self.metrics.increment_deleted();
        info!(upload_id = %upload_id, "upload deleted");
        Ok(())
    }

    /// List identifiers newest first.
    ///
    /// `offset` defaults to 0 and `limit` to [`DEFAULT_LIST_LIMIT`]; `limit`
    /// is capped at [`MAX_LIST_LIMIT`]. Pages are positional, so uploads made
    /// between two calls shift later pages.
    pub async fn list_uploads(&self, offset: Option<u64>, limit: Option<u64>) -> Result<Vec<UploadId>, UploadError> {
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        let ids = self.metadata.list_ordered(offset, limit).await?;
        debug!(offset, limit, returned = ids.len(), "listed uploads");
        Ok(ids)
    }

    /// The identifier `content` maps to, without touching either store.
    ///
    /// Only meaningful when [`is_content_addressed`](Self::is_content_addressed)
    /// is true; an opaque deriver hands out a fresh id on every call.
    pub fn get_id_for_content(&self, content: &[u8]) -> UploadId {
        self.deriver.derive(content)
    }

    /// Whether identical content always maps to the same identifier.
    pub fn is_content_addressed(&self) -> bool {
        self.deriver.is_content_addressed()
    }

    /// Outcome counters for this service.
    pub fn metrics(&self) -> &UploadMetrics {
        &self.metrics
    }
}
