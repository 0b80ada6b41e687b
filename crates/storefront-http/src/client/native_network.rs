use crate::error::{ApiError, Result};
use crate::traits::ApiNetwork;
use crate::types::{ApiRequest, ApiResponse, Method};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;

/// [`ApiNetwork`] backed by `reqwest`.
pub struct NativeNetwork {
    client: Client,
}

impl NativeNetwork {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ApiNetwork for NativeNetwork {
    async fn fetch(&self, url: &str, request: ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req_builder = self.client.request(method, url);
        for (k, v) in &request.headers {
            req_builder = req_builder.header(k, v);
        }
        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body.clone());
        }

        let response = req_builder
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response.bytes().await.map_err(ApiError::from)?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
