use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ContentType, UploadId};

/// Metadata row persisted for every stored upload.
///
/// The metadata store owns uniqueness of [`upload_id`](Self::upload_id);
/// `pk` is an opaque surrogate assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Store-assigned surrogate key.
    pub pk: Uuid,
    /// Content-derived identifier, unique across the store.
    pub upload_id: UploadId,
    /// Content type the upload was submitted with.
    pub content_type: ContentType,
    /// When the record was inserted.
    pub created_at: DateTime<Utc>,
}

/// A record that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub upload_id: UploadId,
    pub content_type: ContentType,
    pub created_at: DateTime<Utc>,
}

impl NewUpload {
    /// Build a new record stamped with the current time.
    #[must_use]
    pub fn now(upload_id: UploadId, content_type: ContentType) -> Self {
        Self {
            upload_id,
            content_type,
            created_at: Utc::now(),
        }
    }

    /// Turn the pending record into a stored one under a fresh surrogate key.
    #[must_use]
    pub fn into_record(self) -> UploadRecord {
        UploadRecord {
            pk: Uuid::new_v4(),
            upload_id: self.upload_id,
            content_type: self.content_type,
            created_at: self.created_at,
        }
    }
}
