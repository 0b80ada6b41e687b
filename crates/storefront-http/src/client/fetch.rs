//! Main storefront HTTP client implementation.

use crate::client::config::ClientConfig;
use crate::client::native_network::NativeNetwork;
use crate::error::{ApiError, Result};
use crate::middleware::{AuthRedirect, Middleware, Navigator, Next, RequestLog, SessionHeaders};
use crate::session::SessionStore;
use crate::traits::ApiNetwork;
use crate::types::{ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Client every storefront call goes through.
///
/// Cheap to clone; clones share the network, the middleware stages and
/// therefore the redirect guard.
#[derive(Clone)]
pub struct ApiClient {
    network: Arc<dyn ApiNetwork>,
    stages: Arc<[Arc<dyn Middleware>]>,
    config: Arc<ClientConfig>,
    base_url: Arc<Url>,
    auth_redirect: Option<Arc<AuthRedirect>>,
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Standard stack: request log, forced logout on 401/403, session credentials.
    pub fn authenticated(
        config: ClientConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Self::builder(config)
            .with(RequestLog)
            .auth_redirect(session.clone(), navigator)
            .with(SessionHeaders::new(session))
            .build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth_redirect(&self) -> Option<&Arc<AuthRedirect>> {
        self.auth_redirect.as_ref()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn url_for(&self, request: &ApiRequest) -> Result<String> {
        let mut url = self.base_url.join(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url.to_string())
    }

    /// Send `request` through the middleware chain.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request)?;
        Next::new(&url, self.network.as_ref(), &self.stages)
            .run(request)
            .await
    }

    /// Send `request` and decode a 2xx JSON body.
    ///
    /// Non-2xx responses become [`ApiError::Status`] carrying the message from
    /// the server's error envelope.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.error_for_status()?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.with_query(*k, *v));
        self.fetch_json(request).await
    }
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    network: Option<Arc<dyn ApiNetwork>>,
    stages: Vec<Arc<dyn Middleware>>,
    auth_redirect: Option<Arc<AuthRedirect>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            network: None,
            stages: Vec::new(),
            auth_redirect: None,
        }
    }

    /// Replace the reqwest-backed network.
    pub fn network(mut self, network: Arc<dyn ApiNetwork>) -> Self {
        self.network = Some(network);
        self
    }

    /// Append a stage to the chain.
    pub fn with(mut self, stage: impl Middleware) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append the forced-logout stage, keeping a handle to it on the client.
    pub fn auth_redirect(mut self, session: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        let stage = Arc::new(AuthRedirect::new(
            session,
            navigator,
            self.config.login_path.clone(),
            self.config.redirect_delay(),
        ));
        self.stages.push(stage.clone());
        self.auth_redirect = Some(stage);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = Url::parse(&self.config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base URL {} cannot carry paths",
                self.config.base_url
            )));
        }

        let network = match self.network {
            Some(network) => network,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(self.config.request_timeout())
                    .user_agent(self.config.user_agent.clone())
                    .build()
                    .map_err(|e| ApiError::Config(e.to_string()))?;
                Arc::new(NativeNetwork::new(client)) as Arc<dyn ApiNetwork>
            }
        };

        Ok(ApiClient {
            network,
            stages: self.stages.into(),
            config: Arc::new(self.config),
            base_url: Arc::new(base_url),
            auth_redirect: self.auth_redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::ChannelNavigator;

    #[test]
    fn test_url_for_encodes_query() {
        let client = ApiClient::builder(ClientConfig::with_base_url("http://shop.local:3000"))
            .build()
            .unwrap();
        let req = ApiRequest::get("/api/chats/get-user-chats").with_query("userId", "a b&c");
        assert_eq!(
            client.url_for(&req).unwrap(),
            "http://shop.local:3000/api/chats/get-user-chats?userId=a+b%26c"
        );
    }

    #[test]
    fn test_url_without_query() {
        let client = ApiClient::builder(ClientConfig::default()).build().unwrap();
        assert_eq!(
            client.url_for(&ApiRequest::get("/v1/home/top_nav")).unwrap(),
            "http://localhost:3000/v1/home/top_nav"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::builder(ClientConfig::with_base_url("not a url")).build();
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_authenticated_stack_order() {
        let (nav, _rx) = ChannelNavigator::new();
        let client =
            ApiClient::authenticated(ClientConfig::default(), SessionStore::new(), Arc::new(nav))
                .unwrap();
        assert_eq!(
            client.stage_names(),
            vec!["request-log", "auth-redirect", "session-headers"]
        );
        assert!(client.auth_redirect().is_some());
    }
}
