//! `SQLite` implementation of [`KeyValueStore`].
//!
//! Deadlines are stored as fixed-width ISO-8601 UTC strings, so expiry can be
//! evaluated with plain string comparison in SQL.

use std::time::Duration;

use sqlx::SqlitePool;

use nightrelay_app::clock::SystemClock;
use nightrelay_app::ports::{Clock, KeyValueStore};
use nightrelay_domain::error::NightRelayError;
use nightrelay_domain::time::to_iso8601;

use crate::error::StorageError;

const SELECT_LIVE: &str = r"
    SELECT value FROM kv
    WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)
";

const UPSERT: &str = r"
    INSERT INTO kv (key, value, expires_at) VALUES (?, ?, ?)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
";

const DELETE_BY_KEY: &str = "DELETE FROM kv WHERE key = ?";
const DELETE_EXPIRED: &str = "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?";

/// `SQLite`-backed key/value store.
pub struct SqliteStore<C = SystemClock> {
    pool: SqlitePool,
    clock: C,
}

impl SqliteStore<SystemClock> {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, SystemClock)
    }
}

impl<C: Clock> SqliteStore<C> {
    /// Create a store whose TTLs are measured against `clock`.
    pub fn with_clock(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    fn now(&self) -> String {
        to_iso8601(self.clock.now())
    }

    /// Remove rows whose expiry has passed. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn purge_expired(&self) -> Result<u64, NightRelayError> {
        let result = sqlx::query(DELETE_EXPIRED)
            .bind(self.now())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(result.rows_affected())
    }

    async fn upsert(
        &self,
        key: &str,
        value: String,
        expires_at: Option<String>,
    ) -> Result<(), NightRelayError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

impl<C: Clock + Send + Sync> KeyValueStore for SqliteStore<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, NightRelayError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_LIVE)
            .bind(key)
            .bind(self.now())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), NightRelayError> {
        self.upsert(key, value, None).await
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), NightRelayError> {
        let deadline = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or(StorageError::TtlOutOfRange(ttl))?;

        self.purge_expired().await?;
        self.upsert(key, value, Some(to_iso8601(deadline))).await
    }

    async fn delete(&self, key: &str) -> Result<(), NightRelayError> {
        sqlx::query(DELETE_BY_KEY)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
