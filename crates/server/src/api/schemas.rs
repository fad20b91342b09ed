use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use cairn_core::UploadId;
use cairn_uploads::MetricsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Current upload metrics snapshot.
    pub metrics: MetricsResponse,
}

/// Upload outcome counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    #[schema(example = 12)]
    pub created: u64,
    #[schema(example = 3)]
    pub duplicates: u64,
    #[schema(example = 240)]
    pub served: u64,
    #[schema(example = 1)]
    pub deleted: u64,
    #[schema(example = 2)]
    pub not_found: u64,
    #[schema(example = 0)]
    pub failed: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            created: snap.created,
            duplicates: snap.duplicates,
            served: snap.served,
            deleted: snap.deleted,
            not_found: snap.not_found,
            failed: snap.failed,
        }
    }
}

/// Multipart form accepted by `POST /uploads`.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// The image to store. Its part content type must be `image/*`.
    #[schema(value_type = String, format = Binary)]
    pub upload: Vec<u8>,
}

/// Identifier of a stored upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "4IIogZ2k7g59PUVk_qadq1TmLTKQicxH")]
    pub upload_id: UploadId,
}

/// A page of upload identifiers, newest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadsListResponse {
    pub uploads: Vec<UploadId>,
}

/// Pagination for `GET /uploads`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Number of uploads to skip. Defaults to 0.
    pub offset: Option<u64>,
    /// Maximum number of uploads to return. Defaults to 10, capped at 100.
    pub limit: Option<u64>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "not found")]
    pub error: String,
}
