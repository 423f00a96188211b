//! History: the audit trail of relay transitions.

use serde::{Deserialize, Serialize};

use crate::relay::RelayState;
use crate::time::Timestamp;

/// Maximum number of entries kept in the ledger.
pub const HISTORY_CAP: usize = 50;

/// Well-known source labels attached to history entries.
pub mod source {
    /// Scheduled expiry of an `on` period.
    pub const AUTO_OFF: &str = "Auto Off";
    /// Default label for browser-initiated triggers.
    pub const WEB_INTERFACE: &str = "Web Interface";
    /// Default label for the external tabular feed.
    pub const SPREADSHEET: &str = "Spreadsheet Activity";
    /// GET-style trigger issued by the email bridge.
    pub const EMAIL_WEBHOOK: &str = "Email Webhook";
    /// Pending pulse armed through the legacy webhook.
    pub const WEBHOOK: &str = "Webhook";
}

/// One immutable record of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "crate::time::iso8601")]
    pub timestamp: Timestamp,
    pub action: RelayState,
    pub source: String,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(timestamp: Timestamp, action: RelayState, source: impl Into<String>) -> Self {
        Self {
            timestamp,
            action,
            source: source.into(),
        }
    }
}

/// Prepend `entry` and drop everything past [`HISTORY_CAP`].
pub fn push_capped(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry) {
    entries.insert(0, entry);
    entries.truncate(HISTORY_CAP);
}
