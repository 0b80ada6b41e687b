use super::{Middleware, Next};
use crate::error::Result;
use crate::session::SessionStore;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;

/// Attaches the session's credentials to every outgoing request.
///
/// Headers set explicitly by the caller win.
#[derive(Clone, Debug)]
pub struct SessionHeaders {
    session: SessionStore,
}

impl SessionHeaders {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for SessionHeaders {
    async fn handle(&self, mut request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
        if request.header("authorization").is_none() {
            if let Some(token) = self.session.token() {
                request = request.with_header("Authorization", format!("Bearer {token}"));
            }
        }
        if request.header("cookie").is_none() {
            if let Some(cookies) = self.session.cookie_header() {
                request = request.with_header("Cookie", cookies);
            }
        }
        next.run(request).await
    }

    fn name(&self) -> &'static str {
        "session-headers"
    }
}
