//! Limiter configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Rejection, Verdict};
use crate::error::ConfigError;
use crate::ports::Publisher;

/// Policy invoked with the attempt count when a check stays under the threshold.
pub type CountHandler = Arc<dyn Fn(u64) -> Verdict + Send + Sync>;

/// Immutable limiter configuration. Build it with [`LimiterConfig::builder`].
#[derive(Clone)]
pub struct LimiterConfig {
    name: String,
    window: Duration,
    block_times: u64,
    block_duration: Duration,
    rejection: Rejection,
    white_list: Vec<String>,
    block_list: Vec<String>,
    publisher: Option<Arc<dyn Publisher>>,
    custom_handler: Option<CountHandler>,
}

impl LimiterConfig {
    /// Start a configuration for limiter `name` counting over `window`.
    pub fn builder(name: impl Into<String>, window: Duration) -> LimiterConfigBuilder {
        LimiterConfigBuilder {
            name: name.into(),
            app: None,
            window,
            block_times: 0,
            block_duration: Duration::ZERO,
            rejection: Rejection::default(),
            white_list: Vec::new(),
            block_list: Vec::new(),
            publisher: None,
            custom_handler: None,
        }
    }

    /// Namespace of every storage key and the broadcast channel.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Attempts within one window that trigger a block. Zero disables blocking.
    pub fn block_times(&self) -> u64 {
        self.block_times
    }

    /// How long a threshold breach stays blocked. Zero means until removed
    /// from the blocklist.
    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }

    pub fn rejection(&self) -> &Rejection {
        &self.rejection
    }

    pub fn white_list(&self) -> &[String] {
        &self.white_list
    }

    pub fn block_list(&self) -> &[String] {
        &self.block_list
    }

    pub(crate) fn publisher(&self) -> Option<&Arc<dyn Publisher>> {
        self.publisher.as_ref()
    }

    pub(crate) fn custom_handler(&self) -> Option<&CountHandler> {
        self.custom_handler.as_ref()
    }
}

impl fmt::Debug for LimiterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimiterConfig")
            .field("name", &self.name)
            .field("window", &self.window)
            .field("block_times", &self.block_times)
            .field("block_duration", &self.block_duration)
            .field("rejection", &self.rejection)
            .field("white_list", &self.white_list)
            .field("block_list", &self.block_list)
            .field("publisher", &self.publisher.is_some())
            .field("custom_handler", &self.custom_handler.is_some())
            .finish()
    }
}

/// Builder for [`LimiterConfig`].
pub struct LimiterConfigBuilder {
    name: String,
    app: Option<String>,
    window: Duration,
    block_times: u64,
    block_duration: Duration,
    rejection: Rejection,
    white_list: Vec<String>,
    block_list: Vec<String>,
    publisher: Option<Arc<dyn Publisher>>,
    custom_handler: Option<CountHandler>,
}

impl LimiterConfigBuilder {
    /// Prefix the limiter name with an application name, giving `{app}-{name}`.
    ///
    /// An empty application name leaves the limiter name unchanged.
    pub fn app_prefix(mut self, app: impl Into<String>) -> Self {
        let app = app.into();
        self.app = (!app.is_empty()).then_some(app);
        self
    }

    pub fn block_times(mut self, times: u64) -> Self {
        self.block_times = times;
        self
    }

    pub fn block_duration(mut self, duration: Duration) -> Self {
        self.block_duration = duration;
        self
    }

    /// Replace the default `403 forbidden` rejection.
    pub fn rejection(mut self, rejection: Rejection) -> Self {
        self.rejection = rejection;
        self
    }

    /// Seed whitelist entries, merged with the durable set at startup.
    pub fn white_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.white_list.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Seed blocklist entries, merged with the durable set at startup.
    pub fn block_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.block_list.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Publisher used to announce list changes on the limiter's channel.
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn custom_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(u64) -> Verdict + Send + Sync + 'static,
    {
        self.custom_handler = Some(Arc::new(handler));
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<LimiterConfig, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }

        let name = match self.app {
            Some(app) => format!("{app}-{}", self.name),
            None => self.name,
        };

        Ok(LimiterConfig {
            name,
            window: self.window,
            block_times: self.block_times,
            block_duration: self.block_duration,
            rejection: self.rejection,
            white_list: self.white_list,
            block_list: self.block_list,
            publisher: self.publisher,
            custom_handler: self.custom_handler,
        })
    }
}
