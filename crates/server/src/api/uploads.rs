use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use cairn_uploads::UploadError;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, ListParams, UploadForm, UploadResponse, UploadsListResponse};

/// Name of the multipart field carrying the content.
pub const UPLOAD_FIELD: &str = "upload";

/// `POST /uploads` -- store an image and return its identifier.
///
/// Answers 201 when the content is new and 200 when it was already stored;
/// the identifier is the same either way.
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    summary = "Upload content",
    description = "Stores the `upload` part of a multipart body. Identical content maps to the same identifier.",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Upload created", body = UploadResponse),
        (status = 200, description = "Content already stored", body = UploadResponse),
        (status = 400, description = "Missing or non-image content type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 413, description = "Body exceeds the configured limit", body = ErrorResponse),
        (status = 422, description = "Missing multipart body or upload field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let mut multipart =
        multipart.map_err(|e| ServerError::Unprocessable(format!("invalid multipart body: {e}")))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = match field.content_type() {
            Some(ct) if ct.starts_with("image/") => ct.to_owned(),
            _ => return Err(ServerError::BadRequest("Bad request - invalid file".into())),
        };
        let content = field.bytes().await.map_err(multipart_error)?;

        return match state.uploads.add_upload(content, &content_type).await {
            Ok(upload_id) => Ok((StatusCode::CREATED, Json(UploadResponse { upload_id })).into_response()),
            Err(UploadError::AlreadyExists(upload_id)) => {
                Ok((StatusCode::OK, Json(UploadResponse { upload_id })).into_response())
            }
            Err(e) => Err(e.into()),
        };
    }

    Err(ServerError::Unprocessable(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::Unprocessable(e.body_text())
    }
}

/// `GET /uploads/{upload_id}` -- fetch stored content.
#[utoipa::path(
    get,
    path = "/uploads/{upload_id}",
    tag = "Uploads",
    summary = "Fetch upload",
    description = "Returns the raw content with its stored content type and a public cache hint.",
    params(("upload_id" = String, Path, description = "Identifier returned by the upload")),
    responses(
        (status = 200, description = "Raw content with the stored content type"),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "Unknown identifier", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Result<Response, ServerError> {
    let stored = state.uploads.get_upload(&upload_id).await?;

    let content_type = HeaderValue::from_str(stored.content_type.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let cache_control = HeaderValue::from_str(&format!(
        "public, max-age={}",
        state.config.cache_max_age_seconds
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("public"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        stored.content,
    )
        .into_response())
}

/// `DELETE /uploads/{upload_id}` -- remove an upload.
#[utoipa::path(
    delete,
    path = "/uploads/{upload_id}",
    tag = "Uploads",
    summary = "Delete upload",
    params(("upload_id" = String, Path, description = "Identifier returned by the upload")),
    responses(
        (status = 204, description = "Upload deleted"),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Unknown identifier", body = ErrorResponse)
    )
)]
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.uploads.delete_upload(&upload_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /uploads` -- list identifiers, newest first.
#[utoipa::path(
    get,
    path = "/uploads",
    tag = "Uploads",
    summary = "List uploads",
    description = "Positional pagination over uploads ordered by creation time, newest first.",
    params(ListParams),
    responses(
        (status = 200, description = "Page of identifiers", body = UploadsListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_uploads(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<UploadsListResponse>, ServerError> {
    let uploads = state
        .uploads
        .list_uploads(params.offset, params.limit)
        .await?;
    Ok(Json(UploadsListResponse { uploads }))
}
