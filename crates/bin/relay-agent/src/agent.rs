//! Poll loop: asks the server for the relay state while the relay is off.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::controller::{RelayController, RelayPin};

/// Errors raised while polling the server.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("unable to build http client")]
    Client(#[source] reqwest::Error),
    #[error("poll request failed")]
    Request(#[source] reqwest::Error),
}

/// Source of the server's answer to a poll.
pub trait PollSource {
    fn poll(&self) -> impl Future<Output = Result<String, PollError>> + Send;
}

/// [`PollSource`] issuing a GET against the server's poll endpoint.
pub struct HttpPoller {
    client: reqwest::Client,
    url: String,
}

impl HttpPoller {
    /// # Errors
    ///
    /// Returns [`PollError::Client`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PollError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PollError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl PollSource for HttpPoller {
    async fn poll(&self) -> Result<String, PollError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(PollError::Request)?;
        response.text().await.map_err(PollError::Request)
    }
}

/// What a single loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Relay on, deadline not reached.
    Holding,
    /// Relay reached its deadline and was switched off.
    TimedOut,
    /// Not yet time to poll.
    Waiting,
    /// Polled; the server answered off (or something unrecognised).
    StayedOff,
    /// Polled; the server answered on and the relay was switched on.
    TurnedOn,
    /// Poll failed; retried after the next poll interval.
    Failed,
}

/// Device-side state machine.
pub struct Agent<P, S> {
    relay: RelayController<P>,
    source: S,
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl<P: RelayPin, S: PollSource> Agent<P, S> {
    pub fn new(relay: RelayController<P>, source: S, poll_interval: Duration) -> Self {
        Self {
            relay,
            source,
            poll_interval,
            last_poll: None,
        }
    }

    #[cfg(test)]
    pub fn relay(&self) -> &RelayController<P> {
        &self.relay
    }

    /// Run one iteration at `now`.
    pub async fn tick(&mut self, now: Instant) -> Tick {
        if self.relay.is_on() {
            return if self.relay.check_timeout(now) {
                Tick::TimedOut
            } else {
                Tick::Holding
            };
        }

        let due = self
            .last_poll
            .is_none_or(|last| now.duration_since(last) >= self.poll_interval);
        if !due {
            return Tick::Waiting;
        }
        self.last_poll = Some(now);

        match self.source.poll().await {
            Ok(body) => {
                let state = body.trim();
                tracing::debug!(%state, "polled");
                if state == "on" {
                    self.relay.turn_on(now);
                    Tick::TurnedOn
                } else {
                    Tick::StayedOff
                }
            }
            Err(err) => {
                tracing::warn!(error = ?err, "poll failed");
                Tick::Failed
            }
        }
    }

    /// Loop every `check_interval` until `shutdown` resolves, then switch
    /// the relay off and hand it back.
    pub async fn run(
        mut self,
        check_interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> RelayController<P> {
        let mut interval = tokio::time::interval(check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick(Instant::now()).await;
                }
            }
        }

        self.relay.turn_off();
        tracing::info!("relay agent stopped");
        self.relay
    }
}
