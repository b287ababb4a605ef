//! Application state - shared across all handlers.

use std::sync::Arc;

use ratewall_core::RateLimiter;
use ratewall_infra::{Backends, Broadcast};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub backends: Backends,
}

impl AppState {
    /// Connect backends, build the limiter and subscribe it to list changes
    /// from other instances.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backends = Backends::connect(&config.redis).await?;
        let limiter = Arc::new(backends.build_limiter(config.limiter.builder()).await?);

        backends.subscribe(limiter.clone()).await?;
        tracing::info!(channel = %limiter.channel(), "Subscribed to list changes");

        tracing::info!("Application state initialized");

        Ok(Self { limiter, backends })
    }

    /// Which backend family is serving this instance.
    pub fn backend_kind(&self) -> &'static str {
        match *self.backends.broadcast {
            Broadcast::Memory(_) => "memory",
            #[cfg(feature = "redis")]
            Broadcast::Redis(_) => "redis",
        }
    }
}
