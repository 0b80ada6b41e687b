use super::{Middleware, Next};
use crate::error::Result;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use std::time::Instant;

/// Logs one line per request with its outcome and latency.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
        let method = request.method;
        let url = next.url().to_string();
        let started = Instant::now();

        let result = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) if response.is_success() => {
                tracing::debug!(%method, %url, status = response.status, elapsed_ms, "request ok");
            }
            Ok(response) => {
                tracing::info!(%method, %url, status = response.status, elapsed_ms, "request failed");
            }
            Err(error) => {
                tracing::warn!(%method, %url, elapsed_ms, %error, "request error");
            }
        }
        result
    }

    fn name(&self) -> &'static str {
        "request-log"
    }
}
