//! Scripted transport for unit tests

use async_trait::async_trait;
use std::sync::Mutex;

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;

/// One call as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

type Handler = dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, ApiError> + Send + Sync;

/// Answers every call through `handler` and records what was sent.
/// Yields once per call so concurrent requests interleave.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.to_string(),
            path: request.path.clone(),
            bearer: bearer.map(str::to_string),
            body: request.body.clone(),
        });
        tokio::task::yield_now().await;
        (self.handler)(request, bearer)
    }
}

pub fn json_response(status: u16, body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(status, body.to_string()))
}
