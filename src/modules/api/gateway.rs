//! Authenticated request gateway
//!
//! Every API call goes through [`Gateway::send`]. The gateway attaches the
//! stored access token, and when a credentialed request comes back 401 it
//! refreshes the access token once and replays the request once. If the
//! refresh itself fails the stored credentials are wiped and the session is
//! marked expired.

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::{classify, ApiError};
use super::request::{ApiRequest, ApiResponse, AuthMode};
use super::transport::Transport;
use crate::modules::session::{CredentialPair, RefreshResponse, SessionState, SharedTokenStore};
use crate::modules::utils::logging::log_api_call;
use crate::TOKEN_REFRESH_PATH;

/// Which send this is for one original call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    /// Sent after a successful refresh; a 401 here is final
    Replay,
}

impl Attempt {
    fn label(self) -> &'static str {
        match self {
            Attempt::Initial => "initial",
            Attempt::Replay => "replay",
        }
    }
}

pub struct Gateway {
    transport: Arc<dyn Transport>,
    store: SharedTokenStore,
    session: SessionState,
    // Held for the duration of one refresh so concurrent 401s share it
    refresh_gate: Mutex<()>,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: SharedTokenStore,
        session: SessionState,
    ) -> Self {
        Self {
            transport,
            store,
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SharedTokenStore {
        &self.store
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Send a request, recovering from one expired access token
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = Attempt::Initial;
        loop {
            let bearer = match request.auth {
                AuthMode::Bearer => self.store.access_token(),
                AuthMode::Anonymous => None,
            };

            let response = match self.transport.send(request, bearer.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    log_api_call(request.method.as_str(), &request.path, None, attempt.label());
                    return Err(e);
                }
            };
            log_api_call(
                request.method.as_str(),
                &request.path,
                Some(response.status),
                attempt.label(),
            );

            let recoverable = response.status == 401
                && attempt == Attempt::Initial
                && request.auth == AuthMode::Bearer;
            if !recoverable {
                return classify(response);
            }

            self.renew_access(bearer.as_deref()).await?;
            attempt = Attempt::Replay;
        }
    }

    /// Send and decode a JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Send and ignore the body (204s, deletes)
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    /// Make sure the stored access token is newer than `stale`.
    ///
    /// Returns once a fresh token is persisted. On refresh failure the session
    /// is torn down and `ApiError::Unauthorized` is returned.
    async fn renew_access(&self, stale: Option<&str>) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.store.access_token();
        if current.is_some() && current.as_deref() != stale {
            debug!("Access token was renewed by a concurrent request, replaying");
            return Ok(());
        }

        let pair = match self.request_new_access().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.end_session();
                return Err(ApiError::Unauthorized);
            }
        };

        self.store.set(&pair)?;
        info!("Access token refreshed");
        Ok(())
    }

    /// Call the refresh endpoint directly on the transport, bypassing `send`
    async fn request_new_access(&self) -> Result<CredentialPair, ApiError> {
        let refresh = self.store.refresh_token().ok_or_else(|| ApiError::Rejected {
            status: 401,
            body: json!({"detail": "No refresh token stored"}),
        })?;

        let request = ApiRequest::post(TOKEN_REFRESH_PATH)
            .body(json!({ "refresh": refresh }))
            .anonymous();
        let response = self.transport.send(&request, None).await?;
        log_api_call("POST", TOKEN_REFRESH_PATH, Some(response.status), "refresh");

        let renewed: RefreshResponse = classify(response)?.json()?;
        Ok(CredentialPair {
            access: renewed.access,
            refresh: renewed.refresh.unwrap_or(refresh),
        })
    }

    /// Terminal failure: wipe credentials and send the user back to login
    fn end_session(&self) {
        if let Err(e) = self.store.clear() {
            error!("Failed to clear stored credentials: {}", e);
        }
        self.session.expire();
    }
}
