//! Relay state: the two legal positions of the relay and the persisted record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Position of the relay. An absent value means [`Off`](Self::Off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    On,
    #[default]
    Off,
}

impl RelayState {
    /// The state a toggle moves to.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is neither `on` nor `off`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown relay state {0:?}")]
pub struct UnknownRelayState(pub String);

impl FromStr for RelayState {
    type Err = UnknownRelayState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(UnknownRelayState(other.to_string())),
        }
    }
}

/// The singleton relay record, assembled from its store keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayRecord {
    pub state: RelayState,
    /// Present iff the relay is on and an auto-off has been scheduled.
    pub auto_off_at: Option<Timestamp>,
    /// Most recent device poll; advisory only.
    pub last_poll: Option<Timestamp>,
    /// Raw identifier of the last external-feed signal acted upon.
    pub last_trigger_timestamp: Option<String>,
}

impl RelayRecord {
    /// Whether the scheduled auto-off has been reached at `now`.
    #[must_use]
    pub fn auto_off_due(&self, now: Timestamp) -> bool {
        self.state == RelayState::On && self.auto_off_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub state: RelayState,
    #[serde(with = "crate::time::iso8601::option")]
    pub auto_off_at: Option<Timestamp>,
}

/// Snapshot reported to the control page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    pub state: RelayState,
    #[serde(with = "crate::time::iso8601::option")]
    pub last_poll: Option<Timestamp>,
    pub can_trigger: bool,
    #[serde(with = "crate::time::iso8601::option")]
    pub auto_off_at: Option<Timestamp>,
    pub message: String,
}
