//! # nightrelayd: night relay daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Initialise the `SQLite` connection pool and run migrations
//! - Construct the relay service, injecting the store, clock and feed
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nightrelay_adapter_feed_reqwest::HttpFeedSource;
use nightrelay_adapter_http_axum::state::{AppState, ButtonMode};
use nightrelay_adapter_storage_sqlite_sqlx::kv_store::SqliteStore;
use nightrelay_adapter_storage_sqlite_sqlx::pool;
use nightrelay_app::clock::SystemClock;
use nightrelay_app::ports::{FeedSource, KeyValueStore};
use nightrelay_app::services::relay_service::RelayService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = pool::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteStore::new(db.pool().clone()));

    // Services
    let relay = RelayService::new(store, SystemClock, config.relay_settings()?);
    let button_mode = config.button_mode()?;
    let bind_addr = config.bind_addr();

    match &config.feed.url {
        Some(url) => {
            let feed = HttpFeedSource::new(url.clone(), config.feed_timeout())?;
            tracing::info!(url = %feed.url(), "external feed enabled");
            serve(relay.with_feed(feed), button_mode, &bind_addr).await
        }
        None => {
            tracing::info!("external feed disabled");
            serve(relay, button_mode, &bind_addr).await
        }
    }
}

async fn serve<S, F>(
    relay: RelayService<S, SystemClock, F>,
    button_mode: ButtonMode,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: KeyValueStore + Clone + Send + Sync + 'static,
    F: FeedSource + Send + Sync + 'static,
{
    let policy = relay.settings().policy.clone();
    let app = nightrelay_adapter_http_axum::router::build(AppState::new(relay, button_mode));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        %button_mode,
        start_hour = policy.window.start_hour(),
        end_hour = policy.window.end_hour(),
        time_zone = %policy.time_zone,
        "nightrelayd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("nightrelayd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
