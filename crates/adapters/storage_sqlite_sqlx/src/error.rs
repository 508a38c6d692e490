//! Storage-specific error type wrapping sqlx errors.

use servicedb_domain::error::ServiceDbError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a JSON column.
    #[error("JSON column error")]
    Json(#[from] serde_json::Error),

    /// Failed to run a store's migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Failed to prepare a store directory.
    #[error("store directory error")]
    Io(#[from] std::io::Error),

    /// The store handed out a row id outside the identity range.
    #[error("row id {0} does not fit a record identity")]
    IdOverflow(i64),

    /// An agent was used before `init_db` or after `close`.
    #[error("{0} store is not open")]
    NotOpen(&'static str),
}

impl From<StorageError> for ServiceDbError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
