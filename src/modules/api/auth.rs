use serde::Serialize;
use serde_json::json;

use super::error::ApiError;
use super::gateway::Gateway;
use super::request::ApiRequest;
use crate::modules::session::{AuthResponse, RefreshResponse, RegisterForm, UserProfile};
use crate::TOKEN_REFRESH_PATH;

const REGISTER_PATH: &str = "/auth/register/";
const LOGIN_PATH: &str = "/auth/login/";
const GOOGLE_PATH: &str = "/auth/google/";
const LOGOUT_PATH: &str = "/auth/logout/";
const ME_PATH: &str = "/auth/me/";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password/";

/// Editable profile fields; unset fields are left alone by the server
#[derive(Serialize, Debug, Clone, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

pub async fn register(gateway: &Gateway, form: &RegisterForm) -> Result<AuthResponse, ApiError> {
    let request = ApiRequest::post(REGISTER_PATH).json(form)?.anonymous();
    gateway.send_json(&request).await
}

pub async fn login(gateway: &Gateway, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
    let request = ApiRequest::post(LOGIN_PATH)
        .body(json!({ "email": email, "password": password }))
        .anonymous();
    gateway.send_json(&request).await
}

/// Exchange a Google ID token for API credentials
pub async fn google_login(gateway: &Gateway, id_token: &str) -> Result<AuthResponse, ApiError> {
    let request = ApiRequest::post(GOOGLE_PATH)
        .body(json!({ "token": id_token }))
        .anonymous();
    gateway.send_json(&request).await
}

/// Blacklist the refresh token server-side
pub async fn logout(gateway: &Gateway, refresh: &str) -> Result<(), ApiError> {
    let request = ApiRequest::post(LOGOUT_PATH).body(json!({ "refresh": refresh }));
    gateway.send_empty(&request).await
}

pub async fn me(gateway: &Gateway) -> Result<UserProfile, ApiError> {
    gateway.send_json(&ApiRequest::get(ME_PATH)).await
}

pub async fn update_profile(
    gateway: &Gateway,
    update: &ProfileUpdate,
) -> Result<UserProfile, ApiError> {
    let request = ApiRequest::patch(ME_PATH).json(update)?;
    gateway.send_json(&request).await
}

pub async fn change_password(
    gateway: &Gateway,
    old_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let request = ApiRequest::post(CHANGE_PASSWORD_PATH).body(json!({
        "old_password": old_password,
        "new_password": new_password,
    }));
    gateway.send_empty(&request).await
}

/// Mint a new access token outside the gateway's own retry path
pub async fn refresh_access(gateway: &Gateway, refresh: &str) -> Result<RefreshResponse, ApiError> {
    let request = ApiRequest::post(TOKEN_REFRESH_PATH)
        .body(json!({ "refresh": refresh }))
        .anonymous();
    gateway.send_json(&request).await
}
