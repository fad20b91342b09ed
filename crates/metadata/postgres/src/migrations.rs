use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the uploads table if it does not exist.
///
/// The `UNIQUE` constraint on `upload_id` is what serializes concurrent
/// uploads of identical content across every instance sharing the database.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let uploads_table = config.uploads_table();
    let listing_index = config.listing_index();

    let create_uploads = format!(
        "CREATE TABLE IF NOT EXISTS {uploads_table} (
            pk UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            upload_id VARCHAR(32) NOT NULL UNIQUE,
            content_type VARCHAR(32) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
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
