//! Forced logout on authentication failure.
//!
//! The first 401/403 observed by this stage clears the session and schedules a
//! single navigation to the login screen. Every later 401/403 is ignored until
//! [`AuthRedirect::rearm`] is called, so a burst of concurrent requests failing
//! together produces exactly one redirect.

use super::{Middleware, Navigator, Next};
use crate::error::Result;
use crate::session::SessionStore;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct AuthRedirect {
    redirecting: AtomicBool,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    delay: Duration,
}

impl AuthRedirect {
    pub fn new(
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            redirecting: AtomicBool::new(false),
            session,
            navigator,
            login_path: login_path.into(),
            delay,
        }
    }

    /// Whether a redirect has already been triggered.
    pub fn is_redirecting(&self) -> bool {
        self.redirecting.load(Ordering::Acquire)
    }

    /// Allow the next 401/403 to trigger a redirect again, e.g. after a new login.
    pub fn rearm(&self) {
        self.redirecting.store(false, Ordering::Release);
    }

    fn on_access_denied(&self, status: u16, url: &str) {
        if self.redirecting.swap(true, Ordering::AcqRel) {
            tracing::debug!(status, url, "redirect already pending, ignoring");
            return;
        }

        let cleared = self.session.clear_all();
        tracing::warn!(
            status,
            url,
            cleared,
            "session rejected, redirecting to {}",
            self.login_path
        );

        let navigator = self.navigator.clone();
        let target = self.login_path.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = navigator.navigate(&target).await {
                tracing::error!("Redirect to {} failed: {}", target, e);
            }
        });
    }
}

#[async_trait]
impl Middleware for AuthRedirect {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
        let url = next.url().to_string();
        let response = next.run(request).await?;
        if response.is_access_denied() {
            self.on_access_denied(response.status, &url);
        }
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "auth-redirect"
    }
}
