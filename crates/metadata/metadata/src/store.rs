use async_trait::async_trait;

use cairn_core::{NewUpload, UploadId, UploadRecord};

use crate::error::MetadataError;

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was stored; this caller owns the identifier.
    Inserted(UploadRecord),
    /// A record with the same identifier already exists. Nothing was written.
    DuplicateKey,
}

/// Trait for persisting upload metadata.
///
/// `insert` is the serialization point for concurrent uploads of the same
/// content: among any number of concurrent inserts of one identifier, across
/// all processes sharing the backend, exactly one observes
/// [`InsertOutcome::Inserted`].
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Atomically insert `upload` unless its identifier is already present.
    async fn insert(&self, upload: NewUpload) -> Result<InsertOutcome, MetadataError>;

    /// Look up a record by identifier. Returns `None` if absent.
    async fn find_by_id(&self, upload_id: &UploadId) -> Result<Option<UploadRecord>, MetadataError>;

    /// Delete a record. Returns `true` if it existed.
    async fn delete(&self, upload_id: &UploadId) -> Result<bool, MetadataError>;

    /// List identifiers newest first, skipping `offset` and returning at most
    /// `limit` items.
    ///
    /// Pagination is positional: inserts between two calls shift later pages.
    async fn list_ordered(&self, offset: u64, limit: u64) -> Result<Vec<UploadId>, MetadataError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64, MetadataError>;
}
