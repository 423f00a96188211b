//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `nightrelay.toml` in the working directory (or the path in
//! `NIGHTRELAY_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use nightrelay_adapter_http_axum::state::ButtonMode;
use nightrelay_app::services::relay_service::RelaySettings;
use nightrelay_domain::history::source;
use nightrelay_domain::window::{AllowedWindow, TriggerPolicy};

const DEFAULT_PATH: &str = "nightrelay.toml";

/// Longest accepted auto-off delay (one day).
const MAX_AUTO_OFF_SECS: u64 = 86_400;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Relay behaviour.
    pub relay: RelayConfig,
    /// Allowed-hours window.
    pub window: WindowConfig,
    /// Optional external feed.
    pub feed: FeedConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Relay state machine settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Seconds between turn-on and automatic turn-off.
    pub auto_off_secs: u64,
    /// Whether manual turn-off is restricted to the allowed window.
    pub gate_turn_off: bool,
    /// `single` (toggle) or `dual` (on/off) controls.
    pub button_mode: String,
    /// Lifetime of a webhook pulse waiting for the next poll.
    pub pulse_ttl_secs: u64,
}

/// Allowed-hours window, in the civil time of `time_zone`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First allowed hour (inclusive).
    pub start_hour: u32,
    /// First disallowed hour (exclusive end).
    pub end_hour: u32,
    /// IANA time zone name.
    pub time_zone: String,
    /// Zone name shown in rejection messages.
    pub zone_label: String,
}

/// External tabular feed.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Feed URL; the feed is disabled when absent.
    pub url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// History label for feed-triggered transitions.
    pub source_label: String,
}

impl Config {
    /// Load configuration from `nightrelay.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("NIGHTRELAY_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("NIGHTRELAY_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("NIGHTRELAY_PORT") {
            self.server.port = parse_env("NIGHTRELAY_PORT", &val)?;
        }
        if let Some(val) = var("NIGHTRELAY_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                self.server.port = parse_env("NIGHTRELAY_BIND", port)?;
            }
        }
        if let Some(val) = var("NIGHTRELAY_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("NIGHTRELAY_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("NIGHTRELAY_AUTO_OFF_SECS") {
            self.relay.auto_off_secs = parse_env("NIGHTRELAY_AUTO_OFF_SECS", &val)?;
        }
        if let Some(val) = var("NIGHTRELAY_GATE_TURN_OFF") {
            self.relay.gate_turn_off = parse_env("NIGHTRELAY_GATE_TURN_OFF", &val)?;
        }
        if let Some(val) = var("NIGHTRELAY_BUTTON_MODE") {
            self.relay.button_mode = val;
        }
        if let Some(val) = var("NIGHTRELAY_WINDOW_START") {
            self.window.start_hour = parse_env("NIGHTRELAY_WINDOW_START", &val)?;
        }
        if let Some(val) = var("NIGHTRELAY_WINDOW_END") {
            self.window.end_hour = parse_env("NIGHTRELAY_WINDOW_END", &val)?;
        }
        if let Some(val) = var("NIGHTRELAY_TIME_ZONE") {
            self.window.time_zone = val;
        }
        if let Some(val) = var("NIGHTRELAY_ZONE_LABEL") {
            self.window.zone_label = val;
        }
        if let Some(val) = var("NIGHTRELAY_FEED_URL") {
            self.feed.url = Some(val).filter(|url| !url.trim().is_empty());
        }
        if let Some(val) = var("NIGHTRELAY_FEED_TIMEOUT_SECS") {
            self.feed.timeout_secs = parse_env("NIGHTRELAY_FEED_TIMEOUT_SECS", &val)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !(1..=MAX_AUTO_OFF_SECS).contains(&self.relay.auto_off_secs) {
            return Err(ConfigError::Validation(format!(
                "relay.auto_off_secs must be in 1..={MAX_AUTO_OFF_SECS}"
            )));
        }
        if self.relay.pulse_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "relay.pulse_ttl_secs must be non-zero".to_string(),
            ));
        }
        if self.feed.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "feed.timeout_secs must be non-zero".to_string(),
            ));
        }
        self.button_mode()?;
        self.trigger_policy()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Parsed control layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for anything but `single`/`dual`.
    pub fn button_mode(&self) -> Result<ButtonMode, ConfigError> {
        self.relay
            .button_mode
            .parse()
            .map_err(|err: nightrelay_adapter_http_axum::state::UnknownButtonMode| {
                ConfigError::Validation(err.to_string())
            })
    }

    /// Allowed-hours policy bound to the configured zone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for out-of-range hours or an
    /// unknown time zone.
    pub fn trigger_policy(&self) -> Result<TriggerPolicy, ConfigError> {
        let window = AllowedWindow::new(self.window.start_hour, self.window.end_hour)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        let time_zone: Tz = self.window.time_zone.parse().map_err(|_| {
            ConfigError::Validation(format!("unknown time zone {:?}", self.window.time_zone))
        })?;
        Ok(TriggerPolicy::new(
            window,
            time_zone,
            self.window.zone_label.clone(),
        ))
    }

    /// Settings for the relay state machine.
    ///
    /// # Errors
    ///
    /// See [`trigger_policy`](Self::trigger_policy).
    pub fn relay_settings(&self) -> Result<RelaySettings, ConfigError> {
        let auto_off_delay = i64::try_from(self.relay.auto_off_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::Validation("relay.auto_off_secs is too large".to_string())
            })?;
        Ok(RelaySettings {
            auto_off_delay,
            policy: self.trigger_policy()?,
            gate_turn_off: self.relay.gate_turn_off,
            feed_source: self.feed.source_label.clone(),
            pulse_ttl: Duration::from_secs(self.relay.pulse_ttl_secs),
        })
    }

    /// Feed request timeout.
    #[must_use]
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{name} has an invalid value: {value:?}")))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:nightrelay.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "nightrelay=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            auto_off_secs: 120,
            gate_turn_off: true,
            button_mode: ButtonMode::default().to_string(),
            pulse_ttl_secs: 60,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 7,
            time_zone: "America/New_York".to_string(),
            zone_label: "EST".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
            source_label: source::SPREADSHEET.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
