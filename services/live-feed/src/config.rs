//! Feed configuration
//!
//! Defaults match the production site; every field can be overridden from
//! the environment.

use std::time::Duration;

use reqwest::Url;

use feed_types::errors::ConfigError;

use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Delay between losing the stream and the next connection attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

pub const ENV_ORIGIN: &str = "LIVE_FEED_ORIGIN";
pub const ENV_EVENTS_PATH: &str = "LIVE_FEED_EVENTS_PATH";
pub const ENV_RETRY_MS: &str = "LIVE_FEED_RETRY_MS";
pub const ENV_HISTORY: &str = "LIVE_FEED_HISTORY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Scheme, host and port of the game server.
    pub origin: String,
    /// Path of the push stream on the origin.
    pub events_path: String,
    pub retry_delay: Duration,
    /// Entries kept per consumer.
    pub history_capacity: usize,
    /// Upper bound on establishing the stream; the body itself never times out.
    pub connect_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            events_path: "/events".to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl FeedConfig {
    /// Defaults overlaid with `LIVE_FEED_*` variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`FeedConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(origin) = lookup(ENV_ORIGIN) {
            config.origin = origin.trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup(ENV_EVENTS_PATH) {
            config.events_path = path;
        }
        if let Some(raw) = lookup(ENV_RETRY_MS) {
            let millis: u64 = parse(ENV_RETRY_MS, &raw)?;
            config.retry_delay = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(ENV_HISTORY) {
            config.history_capacity = parse(ENV_HISTORY, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.events_url().map(|_| ())
    }

    /// Absolute URL of the push stream.
    pub fn events_url(&self) -> Result<Url, ConfigError> {
        let origin =
            Url::parse(&self.origin).map_err(|_| ConfigError::InvalidOrigin(self.origin.clone()))?;
        if !matches!(origin.scheme(), "http" | "https") || origin.cannot_be_a_base() {
            return Err(ConfigError::InvalidOrigin(self.origin.clone()));
        }
        origin
            .join(&self.events_path)
            .map_err(|_| ConfigError::InvalidValue {
                key: ENV_EVENTS_PATH.to_string(),
                value: self.events_path.clone(),
            })
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
