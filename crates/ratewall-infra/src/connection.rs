//! Redis connection configuration shared by every Redis-backed port.

use std::time::Duration;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whether to fall back to in-memory backends if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

/// Open a client and a managed connection, bounded by the connect timeout.
#[cfg(feature = "redis")]
pub(crate) async fn open(
    config: &RedisConfig,
) -> Result<(redis::Client, redis::aio::ConnectionManager), String> {
    let client = redis::Client::open(config.url.as_str()).map_err(|e| e.to_string())?;

    // Use timeout to prevent hanging if Redis is unreachable
    let conn_manager_fut = redis::aio::ConnectionManager::new(client.clone());
    let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
        .await
        .map_err(|_| "Connection timed out".to_string())?
        .map_err(|e| e.to_string())?;

    Ok((client, conn))
}

#[cfg(all(test, feature = "redis"))]
pub(crate) fn test_config() -> RedisConfig {
    RedisConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".to_string()),
        connect_timeout: Duration::from_secs(1),
        fallback_to_memory: false,
    }
}
