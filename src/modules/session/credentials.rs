use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Access/refresh token pair issued by the auth endpoints
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens never end up in logs verbatim
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Identity record returned by `/auth/me/`.
///
/// The session core only passes this through; fields the client does not know
/// about are kept in `extra` so nothing is lost on a round trip.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub date_joined: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        if !self.first_name.trim().is_empty() {
            self.first_name.trim()
        } else if !self.username.is_empty() {
            &self.username
        } else {
            &self.email
        }
    }
}

/// Body shared by login, register and Google sign-in
#[derive(Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub tokens: CredentialPair,
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
    /// Only present on Google sign-in
    #[serde(default)]
    pub created: Option<bool>,
}

/// Body of `/auth/token/refresh/`. `refresh` is only sent back when the
/// server rotates refresh tokens.
#[derive(Deserialize, Debug, Clone)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Registration form posted to `/auth/register/`
#[derive(Serialize, Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let body = r#"{"id":1,"username":"u","email":"u@example.com","theme":"dark"}"#;
        let profile: UserProfile = serde_json::from_str(body).unwrap();

        assert_eq!(profile.id, 1);
        assert_eq!(profile.username, "u");
        assert_eq!(profile.extra.get("theme"), Some(&Value::from("dark")));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["theme"], "dark");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile = UserProfile {
            id: 7,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.display_name(), "ada");

        profile.first_name = "Ada ".to_string();
        assert_eq!(profile.display_name(), "Ada");

        profile.first_name.clear();
        profile.username.clear();
        assert_eq!(profile.display_name(), "ada@example.com");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let pair = CredentialPair::new("secret-access", "secret-refresh");
        let printed = format!("{:?}", pair);
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let parsed: RefreshResponse = serde_json::from_str(r#"{"access":"a2"}"#).unwrap();
        assert_eq!(parsed.access, "a2");
        assert!(parsed.refresh.is_none());
    }
}
