use thiserror::Error;

/// Errors from metadata store operations.
///
/// A duplicate identifier is not an error; it is reported through
/// [`InsertOutcome::DuplicateKey`](crate::InsertOutcome::DuplicateKey).
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}
