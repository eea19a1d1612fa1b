use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;

/// Whether a request carries the stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach `Authorization: Bearer <access>` and recover from one 401 by refreshing
    Bearer,
    /// No credential, and a 401 is reported as-is (login, register, refresh)
    Anonymous,
}

/// Description of an outbound API call.
///
/// The descriptor is never mutated while in flight; a replay after refresh
/// sends the same descriptor with a freshly read token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub auth: AuthMode,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            auth: AuthMode::Bearer,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is given
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }
}

/// Raw response as received, before status classification
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
    }

    /// Body as JSON, falling back to a string for non-JSON bodies
    pub fn json_or_text(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| Value::String(self.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults_to_bearer() {
        let request = ApiRequest::get("/todos/")
            .query("status", "pending")
            .query_opt("priority", None::<&str>)
            .query_opt("category", Some("work"));

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.auth, AuthMode::Bearer);
        assert_eq!(
            request.query,
            vec![
                ("status".to_string(), "pending".to_string()),
                ("category".to_string(), "work".to_string()),
            ]
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_anonymous_with_body() {
        let request = ApiRequest::post("/auth/login/")
            .json(&json!({"email": "a@b.co", "password": "x"}))
            .unwrap()
            .anonymous();

        assert_eq!(request.auth, AuthMode::Anonymous);
        assert_eq!(request.body.unwrap()["email"], "a@b.co");
    }

    #[test]
    fn test_response_body_helpers() {
        let response = ApiResponse::new(200, r#"{"access":"a2"}"#);
        assert!(response.is_success());
        assert_eq!(response.json_or_text()["access"], "a2");

        let html = ApiResponse::new(502, "<html>Bad Gateway</html>");
        assert!(!html.is_success());
        assert_eq!(html.json_or_text(), Value::from("<html>Bad Gateway</html>"));
        assert!(html.json::<Value>().is_err());

        assert_eq!(ApiResponse::new(204, "").json_or_text(), Value::Null);
    }
}
