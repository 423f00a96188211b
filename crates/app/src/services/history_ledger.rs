//! History ledger: capped, newest-first audit trail stored as one value.

use nightrelay_domain::error::{CorruptValueError, NightRelayError};
use nightrelay_domain::history::{HistoryEntry, push_capped};

use crate::ports::KeyValueStore;
use crate::ports::store::keys;

/// Reads and appends to the history array under [`keys::HISTORY`].
///
/// Every append rewrites the whole array. Two concurrent appends may lose
/// one entry; the store offers nothing to prevent it.
pub struct HistoryLedger<S> {
    store: S,
}

impl<S: KeyValueStore> HistoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All entries, newest-first.
    ///
    /// # Errors
    ///
    /// Returns [`NightRelayError::Corrupt`] if the stored array cannot be
    /// decoded, or a storage error from the store.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, NightRelayError> {
        let Some(raw) = self.store.get(keys::HISTORY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            CorruptValueError {
                key: keys::HISTORY,
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Prepend `entry`, evicting the oldest entries past the cap.
    ///
    /// # Errors
    ///
    /// Propagates decode and storage errors.
    pub async fn append(&self, entry: HistoryEntry) -> Result<(), NightRelayError> {
        let mut entries = self.list().await?;
        push_capped(&mut entries, entry);
        let raw = serde_json::to_string(&entries).map_err(|err| CorruptValueError {
            key: keys::HISTORY,
            reason: err.to_string(),
        })?;
        self.store.put(keys::HISTORY, raw).await
    }
}
