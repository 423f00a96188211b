//! In-process key/value store backed by a `HashMap`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nightrelay_domain::error::NightRelayError;
use nightrelay_domain::time::Timestamp;

use crate::clock::SystemClock;
use crate::ports::{Clock, KeyValueStore};

struct Slot {
    value: String,
    expires_at: Option<Timestamp>,
}

/// Non-durable [`KeyValueStore`], useful for tests and single-process demos.
///
/// Expiry is evaluated lazily against the injected clock on every read.
pub struct MemoryStore<C = SystemClock> {
    slots: Mutex<HashMap<String, Slot>>,
    clock: C,
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl MemoryStore<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> MemoryStore<C> {
    /// Create a store whose TTLs are measured against `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut slots = self.slots();
        let expired = slots
            .get(key)
            .is_some_and(|slot| slot.expires_at.is_some_and(|at| now >= at));
        if expired {
            slots.remove(key);
            return None;
        }
        slots.get(key).map(|slot| slot.value.clone())
    }

    fn write(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| {
            let ttl = chrono::Duration::from_std(ttl).ok()?;
            self.clock.now().checked_add_signed(ttl)
        });
        self.slots()
            .insert(key.to_string(), Slot { value, expires_at });
    }
}

impl<C: Clock + Send + Sync> KeyValueStore for MemoryStore<C> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, NightRelayError>> + Send {
        let result = self.read(key);
        async { Ok(result) }
    }

    fn put(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.write(key, value, None);
        async { Ok(()) }
    }

    fn put_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.write(key, value, Some(ttl));
        async { Ok(()) }
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.slots().remove(key);
        async { Ok(()) }
    }
}
