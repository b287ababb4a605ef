//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use ratewall_core::{LimiterConfig, LimiterConfigBuilder, Rejection};
use ratewall_infra::RedisConfig;

use crate::telemetry::TelemetryConfig;

/// A variable that is set but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    NotANumber { key: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for the `/api/limiter` routes. Unset disables them.
    pub admin_token: Option<String>,
    pub redis: RedisConfig,
    pub limiter: LimiterSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: number(&env_lookup, "PORT")?.unwrap_or(8080),
            admin_token: env::var("RATE_LIMIT_ADMIN_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            redis: RedisConfig::from_env(),
            limiter: LimiterSettings::from_env()?,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}

/// Settings for the server's limiter.
#[derive(Debug, Clone)]
pub struct LimiterSettings {
    /// Application name, prefixed to the limiter name when set.
    pub app_name: Option<String>,
    pub name: String,
    pub window: Duration,
    pub block_times: u64,
    /// Zero blocks until the id is removed from the blocklist.
    pub block_duration: Duration,
    /// Answer blocks with 429 instead of 403.
    pub too_many_requests: bool,
    pub white_list: Vec<String>,
    pub block_list: Vec<String>,
    /// Run every `/api` request through the limiter, keyed by client IP.
    pub guard_requests: bool,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            app_name: None,
            name: "api".to_string(),
            window: Duration::from_secs(60),
            block_times: 100,
            block_duration: Duration::ZERO,
            too_many_requests: false,
            white_list: Vec::new(),
            block_list: Vec::new(),
            guard_requests: false,
        }
    }
}

impl LimiterSettings {
    /// Load limiter settings from environment variables.
    ///
    /// Lists are comma-separated: `RATE_LIMIT_WHITELIST=10.0.0.1,10.0.0.2`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Load settings through `lookup`. Numeric variables that are set must
    /// parse; a negative block duration is rejected rather than read as
    /// "block forever".
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let flag = |key: &str| lookup(key).is_some_and(|v| v == "true" || v == "1");

        Ok(Self {
            app_name: lookup("APP_NAME").filter(|s| !s.is_empty()),
            name: lookup("RATE_LIMIT_NAME").unwrap_or(defaults.name),
            window: number(&lookup, "RATE_LIMIT_WINDOW_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
            block_times: number(&lookup, "RATE_LIMIT_BLOCK_TIMES")?
                .unwrap_or(defaults.block_times),
            block_duration: number(&lookup, "RATE_LIMIT_BLOCK_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.block_duration),
            too_many_requests: flag("RATE_LIMIT_TOO_MANY_REQUESTS"),
            white_list: lookup("RATE_LIMIT_WHITELIST")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            block_list: lookup("RATE_LIMIT_BLOCKLIST")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            guard_requests: flag("RATE_LIMIT_GUARD"),
        })
    }

    /// Limiter configuration builder for these settings.
    ///
    /// Validation happens when the builder is built.
    pub fn builder(&self) -> LimiterConfigBuilder {
        let mut builder = LimiterConfig::builder(self.name.clone(), self.window)
            .block_times(self.block_times)
            .block_duration(self.block_duration)
            .white_list(self.white_list.iter().cloned())
            .block_list(self.block_list.iter().cloned());

        if let Some(app) = &self.app_name {
            builder = builder.app_prefix(app.clone());
        }
        if self.too_many_requests {
            builder = builder.rejection(Rejection::too_many_requests());
        }
        builder
    }
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// `None` when unset or blank, an error when set to anything but an
/// unsigned integer.
fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { key, value }),
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
