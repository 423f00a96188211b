//! Axum router assembly.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use nightrelay_app::ports::{Clock, FeedSource, KeyValueStore};

use crate::api;
use crate::page;
use crate::state::{AppState, ButtonMode};

/// Build the top-level axum [`Router`].
///
/// The trigger routes depend on the configured [`ButtonMode`]: single mode
/// exposes `POST /trigger`, dual mode exposes `/trigger_on` and
/// `/trigger_off`. Unknown routes and methods answer `404 Not Found`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level.
pub fn build<S, C, F>(state: AppState<S, C, F>) -> Router
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let pulse = get(api::pulse::<S, C, F>);
    let triggers = match state.button_mode {
        ButtonMode::Single => Router::new().route("/trigger", pulse.post(api::toggle::<S, C, F>)),
        ButtonMode::Dual => Router::new()
            .route("/trigger", pulse)
            .route(
                "/trigger_on",
                get(api::turn_on_from_webhook::<S, C, F>).post(api::turn_on::<S, C, F>),
            )
            .route("/trigger_off", post(api::turn_off::<S, C, F>)),
    };

    Router::new()
        .route("/", get(page::index::<S, C, F>))
        .route("/status", get(api::status::<S, C, F>))
        .route("/history", get(api::history::<S, C, F>))
        .route("/poll", get(api::poll::<S, C, F>))
        .merge(triggers)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
