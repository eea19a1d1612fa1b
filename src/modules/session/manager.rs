use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;

use super::credentials::{AuthResponse, CredentialPair, RegisterForm, UserProfile};
use super::state::{LogoutReason, SessionEvent, SessionSnapshot, SessionState};
use super::token_store::SharedTokenStore;
use crate::modules::api::{auth, ApiError, Gateway};
use crate::modules::utils::logging::log_auth_event;

/// Owns the login/logout lifecycle and publishes it through [`SessionState`]
pub struct SessionManager {
    gateway: Arc<Gateway>,
    store: SharedTokenStore,
    state: SessionState,
}

impl SessionManager {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let store = gateway.store().clone();
        let state = gateway.session().clone();
        Self {
            gateway,
            store,
            state,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Resolve who is logged in at startup.
    ///
    /// Without a stored access token no request is made. A failed identity
    /// lookup clears the stored tokens. Calling this again after resolution
    /// just returns the current snapshot.
    pub async fn initialize(&self) -> SessionSnapshot {
        if !self.state.snapshot().loading() {
            debug!("Session already resolved");
            return self.state.snapshot();
        }

        if self.store.access_token().is_none() {
            self.finish_resolving(None);
            return self.state.snapshot();
        }

        match auth::me(&self.gateway).await {
            Ok(profile) => {
                log_auth_event("restore", &profile.username, true, None);
                self.finish_resolving(Some(profile));
            }
            Err(e) => {
                warn!("Could not restore session: {}", e);
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear stored credentials: {}", e);
                }
                self.finish_resolving(None);
            }
        }
        self.state.snapshot()
    }

    fn finish_resolving(&self, user: Option<UserProfile>) {
        // A failed refresh during the lookup may already have settled the state
        if self.state.snapshot().loading() {
            if let Err(e) = self.state.apply(SessionEvent::Resolved(user)) {
                warn!("{}", e);
            }
        }
    }

    /// Store a fresh credential pair and mark `profile` as logged in
    pub fn login(&self, pair: CredentialPair, profile: UserProfile) -> Result<(), ApiError> {
        let event = SessionEvent::LoggedIn(profile);
        self.state.check(&event)?;
        self.store.set(&pair)?;
        self.state.apply(event)?;
        Ok(())
    }

    /// Drop the stored credentials and the current user
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.clear()?;
        self.state
            .apply(SessionEvent::LoggedOut(LogoutReason::UserRequested))?;
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let result = auth::login(&self.gateway, email, password).await;
        self.establish("login", email, result)
    }

    pub async fn sign_up(&self, form: &RegisterForm) -> Result<UserProfile, ApiError> {
        let result = auth::register(&self.gateway, form).await;
        self.establish("register", &form.email, result)
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProfile, ApiError> {
        let result = auth::google_login(&self.gateway, id_token).await;
        self.establish("google", "google-account", result)
    }

    fn establish(
        &self,
        event_type: &str,
        identity: &str,
        result: Result<AuthResponse, ApiError>,
    ) -> Result<UserProfile, ApiError> {
        match result {
            Ok(response) => {
                let profile = response.user;
                self.login(response.tokens, profile.clone())?;
                log_auth_event(event_type, &profile.username, true, response.message.as_deref());
                Ok(profile)
            }
            Err(e) => {
                log_auth_event(event_type, identity, false, Some(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Revoke the refresh token server-side, then log out locally.
    /// The local logout happens even if the server call fails.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let username = self
            .state
            .snapshot()
            .user()
            .map(|u| u.username.clone())
            .unwrap_or_default();

        if let Some(refresh) = self.store.refresh_token() {
            if let Err(e) = auth::logout(&self.gateway, &refresh).await {
                warn!("Server-side logout failed: {}", e);
            }
        }

        self.logout()?;
        log_auth_event("logout", &username, true, None);
        Ok(())
    }

    /// Re-fetch the logged-in user's profile
    pub async fn refresh_profile(&self) -> Result<UserProfile, ApiError> {
        let profile = auth::me(&self.gateway).await?;
        self.state.update_profile(profile.clone())?;
        Ok(profile)
    }
}
