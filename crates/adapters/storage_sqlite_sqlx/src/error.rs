//! Storage-specific error type wrapping sqlx errors.

use nightrelay_domain::error::NightRelayError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A TTL too large to be represented as a deadline.
    #[error("ttl of {0:?} is out of range")]
    TtlOutOfRange(std::time::Duration),
}

impl From<StorageError> for NightRelayError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
