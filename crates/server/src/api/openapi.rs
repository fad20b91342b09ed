#![allow(clippy::needless_for_each)]

use cairn_core::UploadId;

use super::schemas::{
    ErrorResponse, HealthResponse, MetricsResponse, UploadForm, UploadResponse,
    UploadsListResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Cairn Upload API",
        version = "0.1.0",
        description = "HTTP API for the Cairn content-addressed upload store. Identical content always gets the same identifier.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Uploads", description = "Upload, fetch, list and delete content")
    ),
    paths(
        super::health::health,
        super::uploads::create_upload,
        super::uploads::get_upload,
        super::uploads::delete_upload,
        super::uploads::list_uploads,
    ),
    components(schemas(
        UploadId,
        HealthResponse, MetricsResponse,
        UploadForm, UploadResponse, UploadsListResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
