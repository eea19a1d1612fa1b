use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The few access-token claims the client reads for display.
///
/// Signatures are not verified; the server stays the authority on validity.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AccessClaims {
    pub exp: Option<i64>,
    pub user_id: Option<serde_json::Value>,
}

impl AccessClaims {
    /// Decode the payload segment of a JWT
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().map_or(false, |at| Utc::now() >= at)
    }
}
