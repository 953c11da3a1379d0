// Application state module
// Everything a request handler needs, built once at startup

use std::net::IpAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::limiter::{Clock, RateLimiter, SystemClock};
use crate::upstream::{AnswerProvider, OpenAiProvider, ProviderError};

/// Application state
pub struct AppState {
    pub config: Config,

    /// Per-address request buckets
    pub limiter: RateLimiter<IpAddr>,

    /// `None` when no API credential is configured
    pub provider: Option<Arc<dyn AnswerProvider>>,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Build production state: wall clock and the OpenAI client
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let provider = match config.upstream.api_key() {
            Some(key) => Some(Arc::new(OpenAiProvider::new(&config.upstream, key)?)
                as Arc<dyn AnswerProvider>),
            None => None,
        };
        Ok(Self::with_parts(config, Arc::new(SystemClock), provider))
    }

    /// Build state from explicit collaborators
    pub fn with_parts(
        config: &Config,
        clock: Arc<dyn Clock>,
        provider: Option<Arc<dyn AnswerProvider>>,
    ) -> Self {
        Self {
            config: config.clone(),
            limiter: RateLimiter::per_minute(config.bfhl.rate_limit(), clock),
            provider,
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }

    /// Operator email for response envelopes, empty when unset
    pub fn official_email(&self) -> &str {
        self.config.bfhl.official_email().unwrap_or_default()
    }
}
