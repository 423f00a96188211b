//! Feed deduplicator: at-most-once handling of external feed signals.

use std::future::Future;

use nightrelay_domain::error::NightRelayError;
use nightrelay_domain::feed::parse_feed;

use crate::ports::store::keys;
use crate::ports::{FeedSource, KeyValueStore};

/// Placeholder feed for deployments without an external feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeed;

#[derive(Debug, thiserror::Error)]
#[error("no external feed configured")]
struct FeedDisabled;

impl FeedSource for NoFeed {
    fn fetch(&self) -> impl Future<Output = Result<String, NightRelayError>> + Send {
        async { Err(NightRelayError::Upstream(Box::new(FeedDisabled))) }
    }
}

/// Compares the feed's newest cell against the cursor under
/// [`keys::LAST_TRIGGER_TIME`].
///
/// Comparison is on the raw cell text, so a re-rendering of the same instant
/// (different format or zone) counts as a new signal.
pub struct FeedDeduplicator<S, F> {
    store: S,
    feed: F,
}

impl<S: KeyValueStore, F: FeedSource> FeedDeduplicator<S, F> {
    pub fn new(store: S, feed: F) -> Self {
        Self { store, feed }
    }

    /// Fetch the feed and report whether it carries a signal not yet handled.
    ///
    /// A new signal is recorded as the cursor before returning `true`.
    /// Fetch failures and malformed feeds are logged and reported as `false`.
    ///
    /// # Errors
    ///
    /// Only store failures are returned; the feed itself never fails the call.
    pub async fn check_external_feed(&self) -> Result<bool, NightRelayError> {
        let body = match self.feed.fetch().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = ?err, "feed fetch failed; treating as no signal");
                return Ok(false);
            }
        };

        let signal = match parse_feed(&body) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!(error = %err, "feed unreadable; treating as no signal");
                return Ok(false);
            }
        };

        let cursor = self.store.get(keys::LAST_TRIGGER_TIME).await?;
        if cursor.as_deref() == Some(signal.raw.as_str()) {
            tracing::debug!(cursor = %signal.raw, "feed unchanged");
            return Ok(false);
        }

        self.store
            .put(keys::LAST_TRIGGER_TIME, signal.raw.clone())
            .await?;
        tracing::info!(
            previous = cursor.as_deref().unwrap_or("<none>"),
            current = %signal.raw,
            observed_at = %signal.observed_at,
            "new feed signal"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::services::testing::{CountingStore, StubFeed};
    use std::sync::Arc;

    const BODY_A: &str = "Timestamp,Event\n1/15/2024 23:41:07,motion\n";
    const BODY_B: &str = "Timestamp,Event\n1/15/2024 23:52:13,motion\n";

    fn dedup(
        feed: StubFeed,
    ) -> (
        Arc<CountingStore<MemoryStore>>,
        FeedDeduplicator<Arc<CountingStore<MemoryStore>>, StubFeed>,
    ) {
        let store = Arc::new(CountingStore::new(MemoryStore::new()));
        let dedup = FeedDeduplicator::new(Arc::clone(&store), feed);
        (store, dedup)
    }

    #[tokio::test]
    async fn should_signal_first_value_and_store_cursor() {
        let (store, dedup) = dedup(StubFeed::with_body(BODY_A));

        assert!(dedup.check_external_feed().await.unwrap());
        assert_eq!(
            store.get(keys::LAST_TRIGGER_TIME).await.unwrap().as_deref(),
            Some("1/15/2024 23:41:07")
        );
    }

    #[tokio::test]
    async fn should_not_signal_or_write_when_value_unchanged() {
        let (store, dedup) = dedup(StubFeed::with_body(BODY_A));
        assert!(dedup.check_external_feed().await.unwrap());
        let writes = store.writes();

        assert!(!dedup.check_external_feed().await.unwrap());
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn should_signal_exactly_once_per_new_value() {
        let feed = StubFeed::with_body(BODY_A);
        let (store, dedup) = dedup(feed.clone());
        assert!(dedup.check_external_feed().await.unwrap());

        feed.set_body(BODY_B);
        assert!(dedup.check_external_feed().await.unwrap());
        assert!(!dedup.check_external_feed().await.unwrap());
        assert_eq!(
            store.get(keys::LAST_TRIGGER_TIME).await.unwrap().as_deref(),
            Some("1/15/2024 23:52:13")
        );
    }

    #[tokio::test]
    async fn should_degrade_to_no_signal_when_fetch_fails() {
        let feed = StubFeed::default();
        feed.fail();
        let (store, dedup) = dedup(feed);

        assert!(!dedup.check_external_feed().await.unwrap());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn should_degrade_to_no_signal_when_cell_is_not_a_timestamp() {
        let (store, dedup) = dedup(StubFeed::with_body("Timestamp\nsoon\n"));

        assert!(!dedup.check_external_feed().await.unwrap());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn should_degrade_to_no_signal_when_feed_is_empty() {
        let (_, dedup) = dedup(StubFeed::with_body(""));
        assert!(!dedup.check_external_feed().await.unwrap());
    }

    #[tokio::test]
    async fn should_treat_reformatted_instant_as_new_signal() {
        let feed = StubFeed::with_body("ts\n2024-01-15 23:41:07\n");
        let (_, dedup) = dedup(feed.clone());
        assert!(dedup.check_external_feed().await.unwrap());

        feed.set_body("ts\n2024-01-15T23:41:07\n");
        assert!(dedup.check_external_feed().await.unwrap());
    }

    #[tokio::test]
    async fn should_never_signal_without_feed() {
        let dedup = FeedDeduplicator::new(MemoryStore::new(), NoFeed);
        assert!(!dedup.check_external_feed().await.unwrap());
    }
}
