use sqlx::SqlitePool;

use crate::config::SqliteConfig;

/// Create the uploads table and its listing index if they do not exist.
///
/// `seq` is the rowid alias and breaks ties between equal `created_at`
/// values in insertion order.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &SqlitePool, config: &SqliteConfig) -> Result<(), sqlx::Error> {
    let uploads_table = config.uploads_table();
    let listing_index = config.listing_index();

    let create_uploads = format!(
        "CREATE TABLE IF NOT EXISTS {uploads_table} (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            pk BLOB NOT NULL UNIQUE,
            upload_id TEXT NOT NULL UNIQUE,
            content_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        )"
    );

    let create_index = format!(
        "CREATE INDEX IF NOT EXISTS {listing_index} \
         ON {uploads_table} (created_at DESC, seq DESC)"
    );

    sqlx::query(&create_uploads).execute(pool).await?;
    sqlx::query(&create_index).execute(pool).await?;

    Ok(())
}
