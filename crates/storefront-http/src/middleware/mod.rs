//! Middleware chain every request goes through.
//!
//! Stages run in installation order; the last stage hands the request to the
//! [`ApiNetwork`]. A stage may rewrite the request, inspect the response, or
//! both.

mod auth_redirect;
mod logging;
mod navigator;
mod session_headers;

pub use auth_redirect::AuthRedirect;
pub use logging::RequestLog;
pub use navigator::{ChannelNavigator, Navigator};
pub use session_headers::SessionHeaders;

use crate::error::Result;
use crate::traits::ApiNetwork;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse>;

    fn name(&self) -> &'static str;
}

/// The remainder of the chain, as seen from inside a stage.
pub struct Next<'a> {
    url: &'a str,
    network: &'a dyn ApiNetwork,
    stages: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        url: &'a str,
        network: &'a dyn ApiNetwork,
        stages: &'a [Arc<dyn Middleware>],
    ) -> Self {
        Self {
            url,
            network,
            stages,
        }
    }

    /// Absolute URL the request will be sent to.
    pub fn url(&self) -> &str {
        self.url
    }

    pub async fn run(self, request: ApiRequest) -> Result<ApiResponse> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next::new(self.url, self.network, rest);
                stage.handle(request, next).await
            }
            None => self.network.fetch(self.url, request).await,
        }
    }
}
