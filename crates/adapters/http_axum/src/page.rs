//! Static control page.
//!
//! The page holds no server-side state; it calls `/status`, `/history` and
//! the trigger endpoints from the browser.

use axum::extract::State;
use axum::response::Html;

use crate::state::{AppState, ButtonMode};

const TEMPLATE: &str = include_str!("../assets/index.html");
const MODE_PLACEHOLDER: &str = "{{BUTTON_MODE}}";

/// Fill the page template for `mode`.
#[must_use]
pub fn render(mode: ButtonMode) -> String {
    TEMPLATE.replace(MODE_PLACEHOLDER, mode.as_str())
}

/// `GET /`
pub async fn index<S, C, F>(State(state): State<AppState<S, C, F>>) -> Html<String> {
    Html(state.page.to_string())
}
