use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cairn_core::{ContentType, NewUpload, UploadId, UploadRecord};
use cairn_metadata::error::MetadataError;
use cairn_metadata::store::{InsertOutcome, MetadataStore};

use crate::config::PostgresConfig;
use crate::migrations;

type RecordRow = (Uuid, String, String, DateTime<Utc>);

/// PostgreSQL-backed implementation of [`MetadataStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. Insert-if-absent is a single
/// `INSERT ... ON CONFLICT (upload_id) DO NOTHING RETURNING` statement, so
/// the unique index decides the winner among concurrent inserts from any
/// number of server instances.
pub struct PostgresMetadataStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresMetadataStore {
    /// Create a new `PostgresMetadataStore` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the uploads table exists.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Connection`] if pool creation fails, or
    /// [`MetadataError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, MetadataError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url)
            .await
            .map_err(|e| MetadataError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a `PostgresMetadataStore` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, MetadataError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| MetadataError::Backend(e.to_string()))?;

        tracing::debug!(table = %config.uploads_table(), "postgres metadata store ready");

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
impl MetadataStore for PostgresMetadataStore {
    async fn insert(&self, upload: NewUpload) -> Result<InsertOutcome, MetadataError> {
        let table = self.config.uploads_table();
        let pk = Uuid::new_v4();

        let query = format!(
            "INSERT INTO {table} (pk, upload_id, content_type, created_at) \
             VALUES ($1, $2, $3, $4) \
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

        // No returned row means the conflict clause fired.
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
            "SELECT pk, upload_id, content_type, created_at FROM {table} WHERE upload_id = $1"
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

        let query = format!("DELETE FROM {table} WHERE upload_id = $1");

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
             OFFSET $1 LIMIT $2"
        );

        let rows: Vec<(String,)> = sqlx::query_as(&query)
            .bind(to_i64(offset))
            .bind(to_i64(limit))
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
