//! Sync configuration

use std::time::Duration;
use storefront_http::ClientConfig;

/// Configuration for the polling read models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub client: ClientConfig,
    /// Re-fetch cadence for chat lists and chat messages.
    pub chat_poll_interval: Duration,
    /// Re-fetch cadence for the navigation unread counters.
    pub counts_refresh_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            chat_poll_interval: Duration::from_secs(5),
            counts_refresh_interval: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `STOREFRONT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            client: ClientConfig::from_lookup(&lookup),
            ..Default::default()
        };
        if let Some(secs) = positive_secs(lookup("STOREFRONT_CHAT_POLL_SECS")) {
            config.chat_poll_interval = secs;
        }
        if let Some(secs) = positive_secs(lookup("STOREFRONT_COUNTS_POLL_SECS")) {
            config.counts_refresh_interval = secs;
        }
        config
    }
}

/// Whole seconds; zero or garbage keeps the default.
fn positive_secs(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}
