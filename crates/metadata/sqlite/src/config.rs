use std::path::PathBuf;

/// Configuration for the `SQLite` metadata store backend.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file. Created, along with its parent directory, if missing.
    pub path: PathBuf,

    /// Maximum number of connections in the `sqlx` connection pool.
    pub pool_size: u32,

    /// Prefix applied to table names to avoid collisions (e.g. `"cairn_"`).
    pub table_prefix: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/cairn.sqlite3"),
            pool_size: 5,
            table_prefix: String::from("cairn_"),
        }
    }
}

impl SqliteConfig {
    pub(crate) fn uploads_table(&self) -> String {
        format!("{}uploads", self.table_prefix)
    }

    pub(crate) fn listing_index(&self) -> String {
        format!("{}uploads_created_at_idx", self.table_prefix)
    }
}
