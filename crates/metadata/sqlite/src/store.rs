use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use uuid::Uuid;

use cairn_core::{ContentType, NewUpload, UploadId, UploadRecord};
use cairn_metadata::error::MetadataError;
use cairn_metadata::store::{InsertOutcome, MetadataStore};

use crate::config::SqliteConfig;
use crate::migrations;

type RecordRow = (Uuid, String, String, DateTime<Utc>);

/// SQLite-backed implementation of [`MetadataStore`].
///
/// The database lives in a single file, so records survive restarts of a
/// single server instance. Insert-if-absent is one
/// `INSERT ... ON CONFLICT (upload_id) DO NOTHING RETURNING` statement and
/// the unique index picks the winner among concurrent inserts.
pub struct SqliteMetadataStore {
    pool: SqlitePool,
    config: Arc<SqliteConfig>,
}

impl SqliteMetadataStore {
    /// Open (or create) the database file and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Connection`] if the directory or pool cannot
    /// be created, or [`MetadataError::Backend`] if migrations fail.
    pub async fn new(config: SqliteConfig) -> Result<Self, MetadataError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MetadataError::Connection(format!("{}: {e}", parent.display())))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(options)
            .await
            .map_err(|e| MetadataError::Connection(e.to_string()))?;

        tracing::info!(path = %config.path.display(), "opened sqlite metadata store");

        Self::from_pool(pool, config).await
    }

    /// Create a `SqliteMetadataStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Backend`] if migrations fail.
    pub async fn from_pool(pool: SqlitePool, config: SqliteConfig) -> Result<Self, MetadataError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        tracing::debug!(table = %config.uploads_table(), "sqlite metadata store ready");

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    fn parse_row((pk, upload_id, content_type, created_at): RecordRow) -> Result<UploadRecord, MetadataError> {
        Ok(UploadRecord {
            pk,
            upload_id: UploadId::parse(upload_id)
                .map_err(|e| MetadataError::Corrupt(e.to_string()))?,
            content_type: ContentType::parse(content_type)
                .map_err(|e| MetadataError::Corrupt(e.to_string()))?,
            created_at,
        })
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn insert(&self, upload: NewUpload) -> Result<InsertOutcome, MetadataError> {
        let table = self.config.uploads_table();
        let pk = Uuid::new_v4();

        let query = format!(
            "INSERT INTO {table} (pk, upload_id, content_type, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (upload_id) DO NOTHING \
             RETURNING created_at"
        );

        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(&query)
            .bind(pk)
            .bind(upload.upload_id.as_str())
            .bind(upload.content_type.as_str())
            .bind(upload.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        let Some((created_at,)) = row else {
            return Ok(InsertOutcome::DuplicateKey);
        };

        Ok(InsertOutcome::Inserted(UploadRecord {
            pk,
            upload_id: upload.upload_id,
            content_type: upload.content_type,
            created_at,
        }))
    }

    async fn find_by_id(&self, upload_id: &UploadId) -> Result<Option<UploadRecord>, MetadataError> {
        let table = self.config.uploads_table();

        let query = format!(
            "SELECT pk, upload_id, content_type, created_at FROM {table} WHERE upload_id = ?"
        );

        let row: Option<RecordRow> = sqlx::query_as(&query)
            .bind(upload_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        row.map(Self::parse_row).transpose()
    }

    async fn delete(&self, upload_id: &UploadId) -> Result<bool, MetadataError> {
        let table = self.config.uploads_table();

        let query = format!("DELETE FROM {table} WHERE upload_id = ?");

        let result = sqlx::query(&query)
            .bind(upload_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_ordered(&self, offset: u64, limit: u64) -> Result<Vec<UploadId>, MetadataError> {
        let table = self.config.uploads_table();

        let query = format!(
            "SELECT upload_id FROM {table} \
             ORDER BY created_at DESC, seq DESC \
             LIMIT ? OFFSET ?"
        );

        let rows: Vec<(String,)> = sqlx::query_as(&query)
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(|(id,)| UploadId::parse(id).map_err(|e| MetadataError::Corrupt(e.to_string())))
            .collect()
    }

    async fn count(&self) -> Result<u64, MetadataError> {
        let table = self.config.uploads_table();

        let query = format!("SELECT COUNT(*) FROM {table}");

        let (count,): (i64,) = sqlx::query_as(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
