//! Upload lifecycle for Cairn.
//!
//! [`UploadService`] ties an [`IdDeriver`](cairn_core::IdDeriver), a
//! [`MetadataStore`](cairn_metadata::MetadataStore) and a
//! [`BlobStore`](cairn_blob::BlobStore) together. The metadata store's
//! insert-if-absent is the only synchronization point: whoever wins it writes
//! the blob, everyone else sees [`UploadError::AlreadyExists`].

pub mod builder;
pub mod error;
pub mod metrics;
pub mod service;

pub use builder::UploadServiceBuilder;
pub use error::UploadError;
pub use metrics::{MetricsSnapshot, UploadMetrics};
pub use service::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, StoredUpload, UploadService};
