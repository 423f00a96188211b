//! Relay service: the relay state machine and its time-driven transitions.
//!
//! All state lives in the [`KeyValueStore`]; the service itself holds no
//! mutable state, so any number of concurrent requests may share one
//! instance. Multi-key sequences are not atomic: concurrent transitions
//! resolve per key with last-writer-wins.

use std::time::Duration as StdDuration;

use chrono::Duration;
use nightrelay_domain::error::{CorruptValueError, DeadlineOutOfRange, NightRelayError};
use nightrelay_domain::history::{HistoryEntry, source};
use nightrelay_domain::relay::{RelayRecord, RelayState, RelayStatus, Transition};
use nightrelay_domain::time::{Timestamp, parse_iso8601, to_iso8601};
use nightrelay_domain::window::TriggerPolicy;

use crate::ports::store::keys;
use crate::ports::{Clock, FeedSource, KeyValueStore};
use crate::services::feed_dedup::{FeedDeduplicator, NoFeed};
use crate::services::history_ledger::HistoryLedger;

/// Message reported by the status endpoint while the window is open.
pub const TRIGGER_ALLOWED_MESSAGE: &str = "Relay can be triggered";

/// Per-deployment parameters of the state machine.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Time between a turn-on and its automatic turn-off.
    pub auto_off_delay: Duration,
    /// Allowed-hours policy for state-changing actions.
    pub policy: TriggerPolicy,
    /// Whether manual turn-off is subject to the policy as well.
    pub gate_turn_off: bool,
    /// History label for transitions caused by the external feed.
    pub feed_source: String,
    /// Lifetime of a pulse armed through the legacy webhook.
    pub pulse_ttl: StdDuration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            auto_off_delay: Duration::seconds(120),
            policy: TriggerPolicy::default(),
            gate_turn_off: true,
            feed_source: source::SPREADSHEET.to_string(),
            pulse_ttl: StdDuration::from_secs(60),
        }
    }
}

/// Application service driving the relay.
pub struct RelayService<S, C, F = NoFeed> {
    store: S,
    clock: C,
    ledger: HistoryLedger<S>,
    feed: Option<FeedDeduplicator<S, F>>,
    settings: RelaySettings,
}

impl<S, C> RelayService<S, C, NoFeed>
where
    S: KeyValueStore + Clone,
    C: Clock,
{
    /// Create a service with no external feed.
    pub fn new(store: S, clock: C, settings: RelaySettings) -> Self {
        Self {
            ledger: HistoryLedger::new(store.clone()),
            store,
            clock,
            feed: None,
            settings,
        }
    }
}

impl<S, C, F> RelayService<S, C, F>
where
    S: KeyValueStore + Clone,
    C: Clock,
    F: FeedSource,
{
    /// Attach an external feed, consulted by [`poll`](Self::poll).
    pub fn with_feed<G: FeedSource>(self, feed: G) -> RelayService<S, C, G> {
        RelayService {
            feed: Some(FeedDeduplicator::new(self.store.clone(), feed)),
            store: self.store,
            clock: self.clock,
            ledger: self.ledger,
            settings: self.settings,
        }
    }

    /// Parameters the service was built with.
    #[must_use]
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Whether an external feed is attached.
    #[must_use]
    pub fn has_feed(&self) -> bool {
        self.feed.is_some()
    }

    /// Read the relay record, applying defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`NightRelayError::Corrupt`] if a stored value cannot be
    /// decoded, or a storage error.
    pub async fn load_record(&self) -> Result<RelayRecord, NightRelayError> {
        let state = match self.store.get(keys::STATE).await? {
            Some(raw) => raw.parse().map_err(|err: nightrelay_domain::relay::UnknownRelayState| {
                CorruptValueError {
                    key: keys::STATE,
                    reason: err.to_string(),
                }
            })?,
            None => RelayState::Off,
        };
        let auto_off_at = self.read_timestamp(keys::AUTO_OFF_TIME).await?;
        let last_poll = self.read_timestamp(keys::LAST_POLL).await?;
        let last_trigger_timestamp = self.store.get(keys::LAST_TRIGGER_TIME).await?;

        Ok(RelayRecord {
            state,
            auto_off_at,
            last_poll,
            last_trigger_timestamp,
        })
    }

    async fn read_timestamp(&self, key: &'static str) -> Result<Option<Timestamp>, NightRelayError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        parse_iso8601(&raw).map(Some).ok_or_else(|| {
            CorruptValueError {
                key,
                reason: format!("not an ISO-8601 timestamp: {raw:?}"),
            }
            .into()
        })
    }

    /// Turn the relay on and schedule its auto-off.
    ///
    /// # Errors
    ///
    /// Returns [`NightRelayError::Rejected`] outside the allowed window (no
    /// state is touched), or a storage error.
    pub async fn turn_on(&self, source: &str) -> Result<Transition, NightRelayError> {
        let now = self.clock.now();
        self.enforce_policy(now, source)?;
        self.apply_on(now, source).await
    }

    /// Turn the relay off and cancel any scheduled auto-off.
    ///
    /// Subject to the allowed window only when
    /// [`RelaySettings::gate_turn_off`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`NightRelayError::Rejected`] when gated and outside the
    /// window, or a storage error.
    pub async fn turn_off(&self, source: &str) -> Result<Transition, NightRelayError> {
        let now = self.clock.now();
        if self.settings.gate_turn_off {
            self.enforce_policy(now, source)?;
        }
        self.apply_off(now, source).await
    }

    /// Flip the relay, with the same rules as the explicit transitions.
    ///
    /// # Errors
    ///
    /// See [`turn_on`](Self::turn_on) and [`turn_off`](Self::turn_off).
    pub async fn toggle(&self, source: &str) -> Result<Transition, NightRelayError> {
        self.check_and_apply_auto_off().await?;
        let record = self.load_record().await?;
        match record.state.opposite() {
            RelayState::On => self.turn_on(source).await,
            RelayState::Off => self.turn_off(source).await,
        }
    }

    /// Turn the relay off if its auto-off deadline has passed.
    ///
    /// Never gated by the allowed window. Returns whether a transition
    /// happened. The deadline is cleared before any other write, so a
    /// second call in the same request finds nothing to do.
    ///
    /// # Errors
    ///
    /// Returns decode or storage errors.
    pub async fn check_and_apply_auto_off(&self) -> Result<bool, NightRelayError> {
        let now = self.clock.now();
        self.auto_off_at(now).await
    }

    async fn auto_off_at(&self, now: Timestamp) -> Result<bool, NightRelayError> {
        let record = self.load_record().await?;
        if !record.auto_off_due(now) {
            return Ok(false);
        }
        self.apply_off(now, source::AUTO_OFF).await?;
        Ok(true)
    }

    /// Current state for the control page, after applying any due auto-off.
    ///
    /// # Errors
    ///
    /// Returns decode or storage errors.
    pub async fn status(&self) -> Result<RelayStatus, NightRelayError> {
        let now = self.clock.now();
        self.auto_off_at(now).await?;
        let record = self.load_record().await?;
        let can_trigger = self.settings.policy.is_allowed(now);
        let message = if can_trigger {
            TRIGGER_ALLOWED_MESSAGE.to_string()
        } else {
            self.settings.policy.rejection_message()
        };

        Ok(RelayStatus {
            state: record.state,
            last_poll: record.last_poll,
            can_trigger,
            auto_off_at: record.auto_off_at,
            message,
        })
    }

    /// Handle a device poll and return the state the device should assume.
    ///
    /// Applies any due auto-off; while off, consults the external feed and
    /// any pending webhook pulse, turning on when either signals inside the
    /// allowed window. A signal outside the window is consumed without a
    /// transition. Always records the poll time.
    ///
    /// # Errors
    ///
    /// Returns decode or storage errors. Feed failures are not errors.
    pub async fn poll(&self) -> Result<RelayState, NightRelayError> {
        let now = self.clock.now();
        self.auto_off_at(now).await?;
        let mut state = self.load_record().await?.state;

        if state == RelayState::Off {
            if let Some(source) = self.pending_trigger().await? {
                if self.settings.policy.is_allowed(now) {
                    state = self.apply_on(now, &source).await?.state;
                } else {
                    tracing::info!(%source, "trigger signal outside allowed window; ignored");
                }
            }
        }

        self.store.put(keys::LAST_POLL, to_iso8601(now)).await?;
        Ok(state)
    }

    /// Arm a short-lived pulse that the next poll turns into a turn-on.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn arm_pulse(&self) -> Result<(), NightRelayError> {
        self.store
            .put_with_ttl(keys::PULSE, RelayState::On.to_string(), self.settings.pulse_ttl)
            .await?;
        tracing::info!(ttl_secs = self.settings.pulse_ttl.as_secs(), "webhook pulse armed");
        Ok(())
    }

    /// History entries, newest-first.
    ///
    /// # Errors
    ///
    /// Returns decode or storage errors.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, NightRelayError> {
        self.ledger.list().await
    }

    /// Source label of the signal that should turn the relay on, if any.
    /// Both the feed cursor and the pulse are consumed here.
    async fn pending_trigger(&self) -> Result<Option<String>, NightRelayError> {
        let feed_signal = match &self.feed {
            Some(feed) => feed.check_external_feed().await?,
            None => false,
        };

        let pulse = self.store.get(keys::PULSE).await?.is_some();
        if pulse {
            self.store.delete(keys::PULSE).await?;
        }

        Ok(if feed_signal {
            Some(self.settings.feed_source.clone())
        } else if pulse {
            Some(source::WEBHOOK.to_string())
        } else {
            None
        })
    }

    fn enforce_policy(&self, now: Timestamp, source: &str) -> Result<(), NightRelayError> {
        self.settings.policy.check(now).map_err(|rejection| {
            tracing::warn!(%source, reason = %rejection, "transition rejected");
            rejection.into()
        })
    }

    async fn apply_on(&self, now: Timestamp, source: &str) -> Result<Transition, NightRelayError> {
        let deadline = now
            .checked_add_signed(self.settings.auto_off_delay)
            .ok_or_else(|| DeadlineOutOfRange {
                from: to_iso8601(now),
                delay_secs: self.settings.auto_off_delay.num_seconds(),
            })?;
        self.store
            .put(keys::STATE, RelayState::On.to_string())
            .await?;
        self.store
            .put(keys::AUTO_OFF_TIME, to_iso8601(deadline))
            .await?;
        self.ledger
            .append(HistoryEntry::new(now, RelayState::On, source))
            .await?;
        tracing::info!(%source, auto_off_at = %to_iso8601(deadline), "relay on");

        Ok(Transition {
            state: RelayState::On,
            auto_off_at: Some(deadline),
        })
    }

    async fn apply_off(&self, now: Timestamp, source: &str) -> Result<Transition, NightRelayError> {
        self.store.delete(keys::AUTO_OFF_TIME).await?;
        self.store
            .put(keys::STATE, RelayState::Off.to_string())
            .await?;
        self.ledger
            .append(HistoryEntry::new(now, RelayState::Off, source))
            .await?;
        tracing::info!(%source, "relay off");

        Ok(Transition {
            state: RelayState::Off,
            auto_off_at: None,
        })
    }
}
