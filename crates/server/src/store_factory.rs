use std::sync::Arc;

use cairn_blob::BlobStore;
use cairn_blob_fs::FsBlobStore;
use cairn_blob_memory::MemoryBlobStore;
use cairn_core::{CountingIdDeriver, HashingIdDeriver, IdDeriver};
use cairn_metadata::MetadataStore;
use cairn_metadata_memory::MemoryMetadataStore;
#[cfg(feature = "postgres")]
use cairn_metadata_postgres::{PostgresConfig, PostgresMetadataStore};
use cairn_metadata_sqlite::{SqliteConfig, SqliteMetadataStore};
use tracing::warn;

use crate::config::{BlobConfig, IdStrategy, IdsConfig, MetadataConfig};
use crate::error::ServerError;

/// Construct the identifier deriver from configuration.
pub fn create_deriver(config: &IdsConfig) -> Arc<dyn IdDeriver> {
    match config.strategy {
        IdStrategy::Hash => Arc::new(HashingIdDeriver::new(config.seed)),
        IdStrategy::Counter => Arc::new(CountingIdDeriver::new()),
    }
}

/// Construct a `MetadataStore` from configuration.
pub async fn create_metadata_store(config: &MetadataConfig) -> Result<Arc<dyn MetadataStore>, ServerError> {
    match config.backend.as_str() {
        "sqlite" => create_sqlite(config).await,
        "memory" => {
            warn!("memory metadata backend selected, records will not survive a restart");
            Ok(Arc::new(MemoryMetadataStore::new()))
        }
        #[cfg(feature = "postgres")]
        "postgres" => create_postgres(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported metadata backend: {other} (is the feature enabled?)"
        ))),
    }
}

async fn create_sqlite(config: &MetadataConfig) -> Result<Arc<dyn MetadataStore>, ServerError> {
    let defaults = SqliteConfig::default();
    let sqlite_config = SqliteConfig {
        path: config.path.clone(),
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
    };
    let store = SqliteMetadataStore::new(sqlite_config)
        .await
        .map_err(|e| ServerError::Config(format!("sqlite metadata store: {e}")))?;
    Ok(Arc::new(store))
}

#[cfg(feature = "postgres")]
async fn create_postgres(config: &MetadataConfig) -> Result<Arc<dyn MetadataStore>, ServerError> {
    let url = config.url.as_deref().ok_or_else(|| {
        ServerError::Config("postgres backend requires 'url' in [metadata]".into())
    })?;
    let defaults = PostgresConfig::default();
    let pg_config = PostgresConfig {
        url: url.to_owned(),
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        schema: config.schema.clone().unwrap_or(defaults.schema),
        table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
    };
    let store = PostgresMetadataStore::new(pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("postgres metadata store: {e}")))?;
    Ok(Arc::new(store))
}

/// Construct a `BlobStore` from configuration.
pub async fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        "fs" => {
            let store = FsBlobStore::new(&config.path)
                .await
                .map_err(|e| ServerError::Config(format!("fs blob store: {e}")))?;
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!("unsupported blob backend: {other}"))),
    }
}
