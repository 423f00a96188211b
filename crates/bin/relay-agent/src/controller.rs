//! Relay output driver with a local on-duration.
//!
//! The device turns itself off after `on_duration` regardless of what the
//! server believes, so a lost network never leaves the relay energised.

use std::time::{Duration, Instant};

/// A digital output line driving the relay coil.
pub trait RelayPin {
    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool);
}

/// Pin that only logs level changes. Used on hosts without GPIO.
#[derive(Debug, Default)]
pub struct LogPin {
    level: Option<bool>,
}

#[cfg(test)]
impl LogPin {
    #[must_use]
    pub fn level(&self) -> Option<bool> {
        self.level
    }
}

impl RelayPin for LogPin {
    fn set(&mut self, high: bool) {
        if self.level != Some(high) {
            tracing::info!(level = if high { "high" } else { "low" }, "relay pin");
        }
        self.level = Some(high);
    }
}

/// Tracks relay state and its local deadline.
pub struct RelayController<P> {
    pin: P,
    active_high: bool,
    on_duration: Duration,
    turn_off_at: Option<Instant>,
}

impl<P: RelayPin> RelayController<P> {
    /// Create a controller. The relay is driven to off immediately.
    pub fn new(pin: P, active_high: bool, on_duration: Duration) -> Self {
        let mut controller = Self {
            pin,
            active_high,
            on_duration,
            turn_off_at: None,
        };
        controller.turn_off();
        controller
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.turn_off_at.is_some()
    }

    #[cfg(test)]
    pub fn turn_off_at(&self) -> Option<Instant> {
        self.turn_off_at
    }

    #[cfg(test)]
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Energise the relay until `now + on_duration`.
    pub fn turn_on(&mut self, now: Instant) {
        self.pin.set(self.active_high);
        self.turn_off_at = Some(now + self.on_duration);
        tracing::info!(on_secs = self.on_duration.as_secs(), "relay on");
    }

    /// De-energise the relay and clear the deadline.
    pub fn turn_off(&mut self) {
        self.pin.set(!self.active_high);
        if self.turn_off_at.take().is_some() {
            tracing::info!("relay off");
        }
    }

    /// Turn off if the deadline has passed. Returns whether it did.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.turn_off_at {
            Some(deadline) if now >= deadline => {
                self.turn_off();
                true
            }
            _ => false,
        }
    }
}
