//! Time and timestamp helpers.
//!
//! Every timestamp that leaves the process (store values, JSON bodies) is
//! written as ISO-8601 UTC with millisecond precision, e.g.
//! `2024-01-15T23:30:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for auto-off deadlines, polls and history entries.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp in the wire format.
#[must_use]
pub fn to_iso8601(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a wire-format (or any RFC 3339) timestamp.
#[must_use]
pub fn parse_iso8601(value: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.to_utc())
}

/// `serde(with = ...)` helper for a [`Timestamp`] in the wire format.
pub mod iso8601 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso8601(*ts))
    }

    /// # Errors
    ///
    /// Fails when the string is not RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso8601(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
    }

    /// Same as the parent module for `Option<Timestamp>` (`null` when absent).
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::time::Timestamp;

        /// # Errors
        ///
        /// Propagates serializer errors.
        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&crate::time::to_iso8601(*ts)),
                None => serializer.serialize_none(),
            }
        }

        /// # Errors
        ///
        /// Fails when a present string is not RFC 3339.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    crate::time::parse_iso8601(&raw).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid timestamp {raw:?}"))
                    })
                })
                .transpose()
        }
    }
}
