//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`NightRelayError`] via `#[from]` or an explicit `From` impl.

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum NightRelayError {
    /// A state-changing action was requested outside the allowed window.
    #[error("action rejected by policy")]
    Rejected(#[from] PolicyRejection),

    /// A persisted value could not be decoded.
    #[error("corrupt stored value")]
    Corrupt(#[from] CorruptValueError),

    /// A scheduled instant fell outside the representable range.
    #[error("schedule out of range")]
    OutOfRange(#[from] DeadlineOutOfRange),

    /// The durable store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An upstream source (external feed) failed.
    #[error("upstream error")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Raised when the allowed-hours policy forbids the requested transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PolicyRejection {
    /// Human-readable explanation returned to the caller verbatim.
    pub message: String,
}

/// A value read back from the store did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key {key:?} holds an invalid value: {reason}")]
pub struct CorruptValueError {
    pub key: &'static str,
    pub reason: String,
}

/// Adding a delay to an instant overflowed the calendar range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{delay_secs}s after {from} is out of range")]
pub struct DeadlineOutOfRange {
    pub from: String,
    pub delay_secs: i64,
}
