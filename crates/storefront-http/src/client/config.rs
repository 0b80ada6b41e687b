//! Configuration for the storefront HTTP client.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the storefront HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin the proxy routes are served from.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Delay between a rejected session and the login redirect.
    pub redirect_delay_ms: u64,
    /// Where a rejected session is sent.
    pub login_path: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 30000,
            redirect_delay_ms: 100,
            login_path: "/login".to_string(),
            user_agent: concat!("storefront-http/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `STOREFRONT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("STOREFRONT_BASE_URL").filter(|s| !s.is_empty()) {
            config.base_url = url;
        }
        if let Some(ms) = lookup("STOREFRONT_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            config.request_timeout_ms = ms;
        }
        if let Some(ms) = lookup("STOREFRONT_REDIRECT_DELAY_MS").and_then(|s| s.parse().ok()) {
            config.redirect_delay_ms = ms;
        }
        if let Some(path) = lookup("STOREFRONT_LOGIN_PATH").filter(|s| !s.is_empty()) {
            config.login_path = path;
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}
