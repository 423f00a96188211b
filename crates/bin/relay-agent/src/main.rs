//! # relay-agent: device side of the poll contract
//!
//! Polls the server's `/poll` endpoint while the relay is off, switches the
//! relay on when told to, and switches it off again after a local
//! on-duration. The host build drives a [`LogPin`]; boards with GPIO plug
//! in their own [`RelayPin`](controller::RelayPin).

mod agent;
mod config;
mod controller;

use tracing_subscriber::EnvFilter;

use crate::agent::{Agent, HttpPoller};
use crate::config::Config;
use crate::controller::{LogPin, RelayController};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let relay = RelayController::new(LogPin::default(), config.active_high, config.on_duration());
    let poller = HttpPoller::new(config.poll_url.clone(), config.request_timeout())?;
    let agent = Agent::new(relay, poller, config.poll_interval());

    tracing::info!(
        url = %config.poll_url,
        poll_secs = config.poll_interval_secs,
        on_secs = config.on_duration_secs,
        active_high = config.active_high,
        "relay agent started"
    );

    agent
        .run(config.check_interval(), async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "unable to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
