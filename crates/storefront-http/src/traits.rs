use crate::error::Result;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;

/// Abstraction for network operations.
///
/// `url` is the absolute URL with the query already encoded; the request still
/// carries method, headers and body.
#[async_trait]
pub trait ApiNetwork: Send + Sync + 'static {
    async fn fetch(&self, url: &str, request: ApiRequest) -> Result<ApiResponse>;
}
