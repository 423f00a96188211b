//! Relay API handlers: status, history, device poll and triggers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use nightrelay_app::ports::{Clock, FeedSource, KeyValueStore};
use nightrelay_domain::history::{HistoryEntry, source};
use nightrelay_domain::relay::{RelayState, RelayStatus, Transition};

use crate::error::ApiError;
use crate::state::AppState;

/// Optional body accepted by the trigger endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    pub source: Option<String>,
}

/// Source label carried by a trigger body, or `default` when the body is
/// absent, unparseable or carries a blank label.
#[must_use]
pub fn source_from_body(body: &[u8], default: &str) -> String {
    serde_json::from_slice::<TriggerRequest>(body)
        .ok()
        .and_then(|req| req.source)
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Body of a toggle response.
#[derive(Debug, Serialize)]
pub struct ToggleBody {
    pub state: RelayState,
}

/// Possible responses from the status endpoint.
pub enum StatusResponse {
    Ok(Json<RelayStatus>),
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the history endpoint.
pub enum HistoryResponse {
    Ok(Json<Vec<HistoryEntry>>),
}

impl IntoResponse for HistoryResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the poll endpoint.
pub enum PollResponse {
    State(RelayState),
}

impl IntoResponse for PollResponse {
    fn into_response(self) -> Response {
        match self {
            Self::State(state) => (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                state.as_str(),
            )
                .into_response(),
        }
    }
}

/// Possible responses from the trigger endpoints.
pub enum TriggerResponse {
    Toggled(Json<ToggleBody>),
    Transitioned(Json<Transition>),
    PulseArmed,
}

impl IntoResponse for TriggerResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Toggled(json) => json.into_response(),
            Self::Transitioned(json) => json.into_response(),
            Self::PulseArmed => "Event received".into_response(),
        }
    }
}

/// `GET /status`
pub async fn status<S, C, F>(
    State(state): State<AppState<S, C, F>>,
) -> Result<StatusResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let status = state.relay.status().await?;
    Ok(StatusResponse::Ok(Json(status)))
}

/// `GET /history`
pub async fn history<S, C, F>(
    State(state): State<AppState<S, C, F>>,
) -> Result<HistoryResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let entries = state.relay.history().await?;
    Ok(HistoryResponse::Ok(Json(entries)))
}

/// `GET /poll`
pub async fn poll<S, C, F>(
    State(state): State<AppState<S, C, F>>,
) -> Result<PollResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let relay_state = state.relay.poll().await?;
    Ok(PollResponse::State(relay_state))
}

/// `POST /trigger`
pub async fn toggle<S, C, F>(
    State(state): State<AppState<S, C, F>>,
    body: Bytes,
) -> Result<TriggerResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let source = source_from_body(&body, source::WEB_INTERFACE);
    let transition = state.relay.toggle(&source).await?;
    Ok(TriggerResponse::Toggled(Json(ToggleBody {
        state: transition.state,
    })))
}

/// `POST /trigger_on`
pub async fn turn_on<S, C, F>(
    State(state): State<AppState<S, C, F>>,
    body: Bytes,
) -> Result<TriggerResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let source = source_from_body(&body, source::WEB_INTERFACE);
    let transition = state.relay.turn_on(&source).await?;
    Ok(TriggerResponse::Transitioned(Json(transition)))
}

/// `GET /trigger_on`: issued by the email bridge.
pub async fn turn_on_from_webhook<S, C, F>(
    State(state): State<AppState<S, C, F>>,
) -> Result<TriggerResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let transition = state.relay.turn_on(source::EMAIL_WEBHOOK).await?;
    Ok(TriggerResponse::Transitioned(Json(transition)))
}

/// `POST /trigger_off`
pub async fn turn_off<S, C, F>(
    State(state): State<AppState<S, C, F>>,
    body: Bytes,
) -> Result<TriggerResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let source = source_from_body(&body, source::WEB_INTERFACE);
    let transition = state.relay.turn_off(&source).await?;
    Ok(TriggerResponse::Transitioned(Json(transition)))
}

/// `GET /trigger`: arms a pulse for the next device poll.
pub async fn pulse<S, C, F>(
    State(state): State<AppState<S, C, F>>,
) -> Result<TriggerResponse, ApiError>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    state.relay.arm_pulse().await?;
    Ok(TriggerResponse::PulseArmed)
}
