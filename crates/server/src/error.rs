use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use cairn_uploads::UploadError;

/// Errors that can occur when running the Cairn server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An upload-level error surfaced through the API.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The request was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The request body was missing or could not be processed.
    #[error("{0}")]
    Unprocessable(String),

    /// The request body exceeded the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Authentication failed (missing or invalid credentials).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Upload(UploadError::NotFound(_)) => (StatusCode::NOT_FOUND, "not found".to_owned()),
            Self::Upload(UploadError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Upload(UploadError::AlreadyExists(id)) => {
                (StatusCode::CONFLICT, format!("upload already exists: {id}"))
            }
            Self::Config(_) | Self::Io(_) | Self::Upload(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
