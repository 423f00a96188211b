//! Shared application state for axum handlers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use nightrelay_app::services::relay_service::RelayService;

/// Which trigger controls the control page offers and the router exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    /// One toggle button backed by `POST /trigger`.
    #[default]
    Single,
    /// Separate on/off buttons backed by `/trigger_on` and `/trigger_off`.
    Dual,
}

impl ButtonMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Dual => "dual",
        }
    }
}

impl fmt::Display for ButtonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown button mode {0:?}, expected \"single\" or \"dual\"")]
pub struct UnknownButtonMode(pub String);

impl FromStr for ButtonMode {
    type Err = UnknownButtonMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "dual" => Ok(Self::Dual),
            _ => Err(UnknownButtonMode(s.to_string())),
        }
    }
}

/// Application state shared across all axum handlers.
///
/// Generic over the store, clock and feed types to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do
/// not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, C, F> {
    /// Relay state machine.
    pub relay: Arc<RelayService<S, C, F>>,
    /// Control page, rendered once for the configured button mode.
    pub page: Arc<str>,
    pub button_mode: ButtonMode,
}

impl<S, C, F> Clone for AppState<S, C, F> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            page: Arc::clone(&self.page),
            button_mode: self.button_mode,
        }
    }
}

impl<S, C, F> AppState<S, C, F> {
    /// Create a new application state from the relay service.
    pub fn new(relay: RelayService<S, C, F>, button_mode: ButtonMode) -> Self {
        Self::from_arc(Arc::new(relay), button_mode)
    }

    /// Create a new application state from a pre-wrapped service.
    ///
    /// Use this when the service is shared with background tasks.
    pub fn from_arc(relay: Arc<RelayService<S, C, F>>, button_mode: ButtonMode) -> Self {
        Self {
            relay,
            page: crate::page::render(button_mode).into(),
            button_mode,
        }
    }
}
