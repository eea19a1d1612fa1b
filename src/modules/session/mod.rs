pub mod claims;
pub mod credentials;
pub mod keyring;
pub mod manager;
pub mod state;
pub mod token_store;

pub use claims::AccessClaims;
pub use credentials::{AuthResponse, CredentialPair, RefreshResponse, RegisterForm, UserProfile};
pub use keyring::KeyringTokenStore;
pub use manager::SessionManager;
pub use state::{AuthState, LogoutReason, SessionError, SessionEvent, SessionSnapshot, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, SharedTokenStore, StoreError, TokenStore};
