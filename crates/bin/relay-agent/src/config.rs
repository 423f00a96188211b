//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `relay-agent.toml` in the working directory (or the path in
//! `RELAY_AGENT_CONFIG`). Environment variables take precedence.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_PATH: &str = "relay-agent.toml";

/// Agent configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Full URL of the server's poll endpoint.
    pub poll_url: String,
    /// Seconds between polls while the relay is off.
    pub poll_interval_secs: u64,
    /// Milliseconds between loop iterations.
    pub check_interval_ms: u64,
    /// Seconds the relay stays on once triggered.
    pub on_duration_secs: u64,
    /// Whether the relay is energised by a high output.
    pub active_high: bool,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Filter directive (`RUST_LOG` syntax).
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_url: "http://127.0.0.1:3000/poll".to_string(),
            poll_interval_secs: 5,
            check_interval_ms: 500,
            on_duration_secs: 120,
            active_high: true,
            request_timeout_secs: 10,
            log_filter: "relay_agent=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file (if present) then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("RELAY_AGENT_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("RELAY_AGENT_POLL_URL") {
            self.poll_url = val;
        }
        if let Some(val) = var("RELAY_AGENT_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_env("RELAY_AGENT_POLL_INTERVAL_SECS", &val)?;
        }
        if let Some(val) = var("RELAY_AGENT_ON_DURATION_SECS") {
            self.on_duration_secs = parse_env("RELAY_AGENT_ON_DURATION_SECS", &val)?;
        }
        if let Some(val) = var("RELAY_AGENT_ACTIVE_HIGH") {
            self.active_high = parse_env("RELAY_AGENT_ACTIVE_HIGH", &val)?;
        }
        if let Some(val) = var("RUST_LOG") {
            self.log_filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.poll_url.starts_with("http://") || self.poll_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "poll_url must be an http(s) URL, got {:?}",
                self.poll_url
            )));
        }
        if self.check_interval_ms == 0 || self.on_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "check_interval_ms and on_duration_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    #[must_use]
    pub fn on_duration(&self) -> Duration {
        Duration::from_secs(self.on_duration_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{name} has an invalid value: {value:?}")))
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
