//! End-to-end tests for the full nightrelayd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! store, real services, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use chrono::{Duration, TimeZone};
use http_body_util::BodyExt;
use nightrelay_adapter_http_axum::router;
use nightrelay_adapter_http_axum::state::{AppState, ButtonMode};
use nightrelay_adapter_storage_sqlite_sqlx::kv_store::SqliteStore;
use nightrelay_adapter_storage_sqlite_sqlx::pool::Config;
use nightrelay_app::clock::ManualClock;
use nightrelay_app::ports::FeedSource;
use nightrelay_app::services::relay_service::{RelayService, RelaySettings};
use nightrelay_domain::error::NightRelayError;
use nightrelay_domain::time::Timestamp;
use tower::ServiceExt;

/// Feed whose body the test can change between polls.
#[derive(Clone, Default)]
struct SharedFeed(Arc<Mutex<Option<String>>>);

impl SharedFeed {
    fn publish(&self, body: &str) {
        *self.0.lock().unwrap() = Some(body.to_string());
    }
}

impl FeedSource for SharedFeed {
    async fn fetch(&self) -> Result<String, NightRelayError> {
        let body = self.0.lock().unwrap().clone();
        body.ok_or_else(|| NightRelayError::Upstream("feed offline".into()))
    }
}

struct Harness {
    app: axum::Router,
    clock: Arc<ManualClock>,
    feed: SharedFeed,
}

/// New York civil time on 2024-01-15.
fn ny(hour: u32, min: u32) -> Timestamp {
    chrono_tz::America::New_York
        .with_ymd_and_hms(2024, 1, 15, hour, min, 0)
        .unwrap()
        .to_utc()
}

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app(start: Timestamp, mode: ButtonMode) -> Harness {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let clock = Arc::new(ManualClock::new(start));
    let store = Arc::new(SqliteStore::with_clock(
        db.pool().clone(),
        Arc::clone(&clock),
    ));
    let feed = SharedFeed::default();

    let relay = RelayService::new(store, Arc::clone(&clock), RelaySettings::default())
        .with_feed(feed.clone());

    Harness {
        app: router::build(AppState::new(relay, mode)),
        clock,
        feed,
    }
}

impl Harness {
    async fn send(&self, method: &str, uri: &str, body: &str) -> Response<Body> {
        self.app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json(&self, method: &str, uri: &str, body: &str) -> serde_json::Value {
        let response = self.send(method, uri, body).await;
        serde_json::from_str(&text(response).await).unwrap()
    }
}

async fn text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Control page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_render_control_page() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    let response = h.send("GET", "/", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = text(response).await;
    assert!(body.contains("Night Relay"));
    assert!(body.contains(r#"data-mode="dual""#));
}

// ---------------------------------------------------------------------------
// Manual transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_turn_on_inside_window_and_schedule_auto_off() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;

    let response = h
        .send("POST", "/trigger_on", r#"{"source":"Web Interface"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(body["state"], "on");
    assert_eq!(body["autoOffAt"], "2024-01-16T04:32:00.000Z");

    let history = h.json("GET", "/history", "").await;
    assert_eq!(history[0]["action"], "on");
    assert_eq!(history[0]["source"], "Web Interface");
    assert_eq!(history[0]["timestamp"], "2024-01-16T04:30:00.000Z");
}

#[tokio::test]
async fn should_reject_turn_on_at_noon() {
    let h = app(ny(12, 0), ButtonMode::Dual).await;

    let response = h.send("POST", "/trigger_on", "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(
        body["error"],
        "Relay can only be triggered between 11 PM and 7 AM EST"
    );

    let status = h.json("GET", "/status", "").await;
    assert_eq!(status["state"], "off");
    assert_eq!(status["canTrigger"], false);
    assert_eq!(
        status["message"],
        "Relay can only be triggered between 11 PM and 7 AM EST"
    );
    assert_eq!(h.json("GET", "/history", "").await, serde_json::json!([]));
}

#[tokio::test]
async fn should_default_source_for_malformed_body() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    h.send("POST", "/trigger_on", "{not json").await;

    let history = h.json("GET", "/history", "").await;
    assert_eq!(history[0]["source"], "Web Interface");
}

#[tokio::test]
async fn should_toggle_in_single_button_mode() {
    let h = app(ny(0, 15), ButtonMode::Single).await;

    assert_eq!(h.json("POST", "/trigger", "").await["state"], "on");
    assert_eq!(h.json("POST", "/trigger", "").await["state"], "off");

    let status = h.json("GET", "/status", "").await;
    assert_eq!(status["state"], "off");
    assert!(status["autoOffAt"].is_null());
}

// ---------------------------------------------------------------------------
// Auto-off
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_auto_off_after_deadline_via_status() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    h.send("POST", "/trigger_on", "").await;

    h.clock.advance(Duration::seconds(119));
    assert_eq!(h.json("GET", "/status", "").await["state"], "on");

    h.clock.advance(Duration::seconds(1));
    let status = h.json("GET", "/status", "").await;
    assert_eq!(status["state"], "off");
    assert!(status["autoOffAt"].is_null());

    let history = h.json("GET", "/history", "").await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["action"], "off");
    assert_eq!(history[0]["source"], "Auto Off");
}

#[tokio::test]
async fn should_auto_off_via_poll_and_report_off() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    h.send("POST", "/trigger_on", "").await;
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "on");

    h.clock.advance(Duration::minutes(3));
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "off");
}

// ---------------------------------------------------------------------------
// Device poll and external triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_turn_on_from_new_feed_value_on_poll() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    h.feed.publish("Timestamp,Note\n1/15/2024 23:29:10,door\n");

    let response = h.send("GET", "/poll", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "on");

    let history = h.json("GET", "/history", "").await;
    assert_eq!(history[0]["source"], "Spreadsheet Activity");

    let status = h.json("GET", "/status", "").await;
    assert_eq!(status["lastPoll"], "2024-01-16T04:30:00.000Z");
}

#[tokio::test]
async fn should_fire_once_per_feed_value() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    h.feed.publish("Timestamp\n1/15/2024 23:29:10\n");
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "on");

    h.clock.advance(Duration::minutes(3));
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "off");
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "off");

    h.feed.publish("Timestamp\n1/15/2024 23:33:00\n");
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "on");
}

#[tokio::test]
async fn should_stay_off_when_feed_is_down() {
    let h = app(ny(23, 30), ButtonMode::Dual).await;
    let response = h.send("GET", "/poll", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "off");
}

#[tokio::test]
async fn should_turn_on_from_legacy_pulse() {
    let h = app(ny(23, 30), ButtonMode::Single).await;
    let response = h.send("GET", "/trigger", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "Event received");

    assert_eq!(text(h.send("GET", "/poll", "").await).await, "on");
    let history = h.json("GET", "/history", "").await;
    assert_eq!(history[0]["source"], "Webhook");
}

#[tokio::test]
async fn should_drop_pulse_after_ttl() {
    let h = app(ny(23, 30), ButtonMode::Single).await;
    h.send("GET", "/trigger", "").await;

    h.clock.advance(Duration::seconds(61));
    assert_eq!(text(h.send("GET", "/poll", "").await).await, "off");
}

#[tokio::test]
async fn should_accept_email_webhook_get() {
    let h = app(ny(1, 0), ButtonMode::Dual).await;
    let body = h.json("GET", "/trigger_on", "").await;
    assert_eq!(body["state"], "on");

    let history = h.json("GET", "/history", "").await;
    assert_eq!(history[0]["source"], "Email Webhook");
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_cap_history_at_fifty_entries() {
    let h = app(ny(23, 0), ButtonMode::Single).await;
    for _ in 0..60 {
        h.send("POST", "/trigger", "").await;
        h.clock.advance(Duration::seconds(1));
    }

    let history = h.json("GET", "/history", "").await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0]["action"], "off");
    assert_eq!(entries[0]["timestamp"], "2024-01-16T04:00:59.000Z");
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_not_found_for_unknown_route() {
    let h = app(ny(23, 30), ButtonMode::Single).await;
    let response = h.send("GET", "/api/entities", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(response).await, "Not Found");
}
