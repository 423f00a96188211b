//! Test doubles shared by the service tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nightrelay_domain::error::NightRelayError;

use crate::ports::{FeedSource, KeyValueStore};

/// Feed whose body can be swapped between calls.
#[derive(Clone, Default)]
pub struct StubFeed {
    body: Arc<Mutex<Option<String>>>,
}

impl StubFeed {
    pub fn with_body(body: &str) -> Self {
        let feed = Self::default();
        feed.set_body(body);
        feed
    }

    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = Some(body.to_string());
    }

    /// Make subsequent fetches fail.
    pub fn fail(&self) {
        *self.body.lock().unwrap() = None;
    }
}

impl FeedSource for StubFeed {
    fn fetch(&self) -> impl Future<Output = Result<String, NightRelayError>> + Send {
        let body = self.body.lock().unwrap().clone();
        async move {
            body.ok_or_else(|| NightRelayError::Upstream("feed unreachable".into()))
        }
    }
}

/// Store wrapper that counts mutating calls.
pub struct CountingStore<S> {
    inner: S,
    writes: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<S: KeyValueStore + Send + Sync> KeyValueStore for CountingStore<S> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, NightRelayError>> + Send {
        self.inner.get(key)
    }

    fn put(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn put_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_with_ttl(key, value, ttl)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), NightRelayError>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }
}
