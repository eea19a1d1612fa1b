use serde_json::Value;

use super::request::ApiResponse;
use crate::modules::session::{SessionError, StoreError};

/// Everything an API call can fail with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The session ended because the refresh token was rejected
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// A 401 handed back without a refresh attempt
    #[error("Request rejected ({status}): {body}")]
    Rejected { status: u16, body: Value },

    /// Any other 4xx; `errors` is the server body untouched, usually field messages
    #[error("Request invalid ({status}): {errors}")]
    Validation { status: u16, errors: Value },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. }
            | ApiError::Validation { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// First human-readable message in a validation body, if any.
    ///
    /// Handles `{"error": "..."}`, `{"detail": "..."}`, and
    /// `{"field": ["msg", ...]}` shapes.
    pub fn first_message(&self) -> Option<String> {
        let body = match self {
            ApiError::Validation { errors, .. } => errors,
            ApiError::Rejected { body, .. } => body,
            _ => return None,
        };
        first_message_in(body)
    }
}

fn first_message_in(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message_in),
        Value::Object(map) => ["error", "detail", "non_field_errors"]
            .iter()
            .find_map(|key| map.get(*key).and_then(first_message_in))
            .or_else(|| {
                map.iter().find_map(|(field, v)| {
                    first_message_in(v).map(|msg| format!("{}: {}", field, msg))
                })
            }),
        _ => None,
    }
}

/// Turn a raw response into success or the matching error class
pub fn classify(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    match response.status {
        200..=299 => Ok(response),
        401 => Err(ApiError::Rejected {
            status: 401,
            body: response.json_or_text(),
        }),
        400..=499 => Err(ApiError::Validation {
            status: response.status,
            errors: response.json_or_text(),
        }),
        500..=599 => Err(ApiError::Server {
            status: response.status,
            body: response.text(),
        }),
        status => Err(ApiError::Decode(format!("status {}", status))),
    }
}
