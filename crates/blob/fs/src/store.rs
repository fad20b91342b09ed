use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info, warn};

use cairn_blob::error::BlobError;
use cairn_blob::store::BlobStore;
use cairn_core::UploadId;

/// [`BlobStore`] keeping one file per upload under a base directory.
///
/// Writes land in a hidden temporary file first and are renamed into place,
/// so a reader sees either the previous content or the complete new content.
/// Upload ids never contain `.` or `/`, which keeps keys inside the base
/// directory and keeps them apart from temporary file names.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `base_path`, creating the directory if needed.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, BlobError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;

        info!(path = %base_path.display(), "initialized blob store");

        Ok(Self { base_path })
    }

    /// The directory blobs are stored in.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, key: &UploadId) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(format!(".tmp-{}", uuid::Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &UploadId, data: Bytes) -> Result<(), BlobError> {
        let temp = self.temp_path();
        let target = self.blob_path(key);

        if let Err(e) = fs::write(&temp, &data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(path = %temp.display(), error = %cleanup, "failed to remove temporary blob");
            }
            return Err(e.into());
        }

        debug!(upload_id = %key, size = data.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &UploadId) -> Result<Bytes, BlobError> {
        match fs::read(self.blob_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &UploadId) -> Result<bool, BlobError> {
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
