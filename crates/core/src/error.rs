use thiserror::Error;

/// Validation errors for the core value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The upload identifier is empty, too long, or contains characters
    /// outside `[A-Za-z0-9_-]`.
    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),

    /// The content type is empty or longer than the stored column allows.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
}
