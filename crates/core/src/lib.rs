pub mod deriver;
pub mod error;
pub mod record;
pub mod types;

pub use deriver::{CountingIdDeriver, DEFAULT_SEED, HashingIdDeriver, IdDeriver, derive_upload_id};
pub use error::CoreError;
pub use record::{NewUpload, UploadRecord};
pub use types::{ContentType, MAX_CONTENT_TYPE_LEN, MAX_UPLOAD_ID_LEN, UploadId};
