use log::{debug, info};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use super::credentials::UserProfile;

/// Who is logged in, as far as the client knows
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Identity lookup at startup has not finished yet
    Resolving,
    Anonymous,
    Authenticated(UserProfile),
}

impl AuthState {
    fn name(&self) -> &'static str {
        match self {
            AuthState::Resolving => "Resolving",
            AuthState::Anonymous => "Anonymous",
            AuthState::Authenticated(_) => "Authenticated",
        }
    }
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The refresh token was rejected; views should send the user to login
    SessionExpired,
}

/// Inputs to the session state machine
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Startup identity lookup finished
    Resolved(Option<UserProfile>),
    LoggedIn(UserProfile),
    LoggedOut(LogoutReason),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Resolved(Some(_)) => write!(f, "resolved(user)"),
            SessionEvent::Resolved(None) => write!(f, "resolved(none)"),
            SessionEvent::LoggedIn(_) => write!(f, "login"),
            SessionEvent::LoggedOut(reason) => write!(f, "logout({:?})", reason),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session transition from {from} on {event}")]
    InvalidTransition { from: &'static str, event: String },
}

/// What subscribers observe
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: AuthState,
    /// Set by the most recent logout, cleared on login
    pub logout_reason: Option<LogoutReason>,
}

impl SessionSnapshot {
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(self.state, AuthState::Resolving)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn is_expired(&self) -> bool {
        self.logout_reason == Some(LogoutReason::SessionExpired)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: AuthState::Resolving,
            logout_reason: None,
        }
    }
}

/// Compute the next state, or `None` when the event changes nothing
fn next_state(
    current: &AuthState,
    event: &SessionEvent,
) -> Result<Option<AuthState>, SessionError> {
    let next = match (current, event) {
        (AuthState::Resolving, SessionEvent::Resolved(Some(user))) => {
            Some(AuthState::Authenticated(user.clone()))
        }
        (AuthState::Resolving, SessionEvent::Resolved(None)) => Some(AuthState::Anonymous),
        // Refresh failed while the identity lookup was in flight
        (AuthState::Resolving, SessionEvent::LoggedOut(LogoutReason::SessionExpired)) => {
            Some(AuthState::Anonymous)
        }
        (AuthState::Anonymous, SessionEvent::LoggedIn(user)) => {
            Some(AuthState::Authenticated(user.clone()))
        }
        (AuthState::Authenticated(_), SessionEvent::LoggedOut(_)) => Some(AuthState::Anonymous),
        (AuthState::Anonymous, SessionEvent::LoggedOut(_)) => None,
        (from, event) => {
            return Err(SessionError::InvalidTransition {
                from: from.name(),
                event: event.to_string(),
            })
        }
    };
    Ok(next)
}

/// Single source of truth for the current session.
///
/// Cloning yields another handle onto the same state; subscribers are woken on
/// every effective transition.
#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn apply(&self, event: SessionEvent) -> Result<(), SessionError> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|snapshot| {
            match next_state(&snapshot.state, &event) {
                Ok(Some(next)) => {
                    debug!(
                        "Session {} -> {} on {}",
                        snapshot.state.name(),
                        next.name(),
                        event
                    );
                    snapshot.logout_reason = match &event {
                        SessionEvent::LoggedOut(reason) => Some(*reason),
                        SessionEvent::LoggedIn(_) => None,
                        SessionEvent::Resolved(_) => snapshot.logout_reason,
                    };
                    snapshot.state = next;
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    /// Check that `event` would be accepted without applying it
    pub fn check(&self, event: &SessionEvent) -> Result<(), SessionError> {
        next_state(&self.tx.borrow().state, event).map(|_| ())
    }

    pub fn can_apply(&self, event: &SessionEvent) -> bool {
        self.check(event).is_ok()
    }

    /// Replace the profile of the logged-in user without changing state
    pub fn update_profile(&self, profile: UserProfile) -> Result<(), SessionError> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|snapshot| match &mut snapshot.state {
            AuthState::Authenticated(user) => {
                let changed = *user != profile;
                *user = profile;
                changed
            }
            other => {
                outcome = Err(SessionError::InvalidTransition {
                    from: other.name(),
                    event: "profile update".to_string(),
                });
                false
            }
        });
        outcome
    }

    /// Forced logout after a failed refresh. Safe from any state.
    ///
    /// State and reason are read and written under one channel lock.
    pub fn expire(&self) {
        let reason = Some(LogoutReason::SessionExpired);
        self.tx.send_if_modified(|snapshot| match snapshot.state {
            AuthState::Resolving | AuthState::Authenticated(_) => {
                info!("Session expired, returning to login");
                debug!("Session {} -> Anonymous on expiry", snapshot.state.name());
                snapshot.state = AuthState::Anonymous;
                snapshot.logout_reason = reason;
                true
            }
            AuthState::Anonymous => {
                let changed = snapshot.logout_reason != reason;
                snapshot.logout_reason = reason;
                changed
            }
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
