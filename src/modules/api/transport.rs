//! HTTP plumbing underneath the gateway

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse};
use crate::APP_USER_AGENT;

/// Sends one request and hands back whatever status the server answered with.
/// Only the absence of a response is an error here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport rooted at the API base URL
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Extra headers to send; a stored bearer wins over a caller's `Authorization`
fn caller_headers<'a>(
    request: &'a ApiRequest,
    bearer: Option<&str>,
) -> impl Iterator<Item = &'a (String, String)> {
    let has_bearer = bearer.is_some();
    request
        .headers
        .iter()
        .filter(move |(name, _)| !(has_bearer && name.eq_ignore_ascii_case("authorization")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in caller_headers(request, bearer) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
