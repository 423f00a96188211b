//! Store port: durable key/value persistence with optional expiry.
//!
//! The store offers no transactions and no compare-and-swap. Every
//! multi-key sequence in the services is a series of independent writes
//! with last-writer-wins semantics per key.

use std::future::Future;
use std::time::Duration;

use nightrelay_domain::error::NightRelayError;

/// Keys under which the relay record and ledger are persisted.
pub mod keys {
    /// `on` / `off`; absent means `off`.
    pub const STATE: &str = "state";
    /// ISO-8601 auto-off deadline; absent when nothing is scheduled.
    pub const AUTO_OFF_TIME: &str = "auto_off_time";
    /// ISO-8601 time of the last device poll.
    pub const LAST_POLL: &str = "lastPoll";
    /// Raw feed cell of the last external signal acted upon.
    pub const LAST_TRIGGER_TIME: &str = "last_trigger_time";
    /// JSON array of history entries, newest-first.
    pub const HISTORY: &str = "history";
    /// Pending webhook pulse, written with a TTL.
    pub const PULSE: &str = "gpio_trigger";
}

/// Opaque string map with per-key optional expiry.
pub trait KeyValueStore {
    /// Read a key. Expired keys read as `None`.
    fn get(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, NightRelayError>> + Send;

    /// Write a key with no expiry, replacing any previous value and TTL.
    fn put(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send;

    /// Write a key that disappears after `ttl`.
    fn put_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), NightRelayError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for std::sync::Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, NightRelayError>> + Send {
        (**self).get(key)
    }

    fn put(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        (**self).put(key, value)
    }

    fn put_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        (**self).put_with_ttl(key, value, ttl)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        (**self).delete(key)
    }
}
