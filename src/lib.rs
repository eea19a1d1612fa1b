// First, declare the modules folder itself
mod modules;

// Re-export the public areas
pub use modules::{api, cli, config, session, utils};

// Re-export commonly used types
pub use modules::api::{ApiError, Gateway, HttpTransport};
pub use modules::config::AppConfig;
pub use modules::session::{SessionManager, SessionSnapshot, TokenStore};

// Constants
pub const APP_NAME: &str = "lifeos";
pub const APP_USER_AGENT: &str = concat!("lifeos-client/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const KEYRING_SERVICE: &str = "lifeos";
pub const TOKEN_REFRESH_PATH: &str = "/auth/token/refresh/";
pub const CONFIG_FILE: &str = "config.json";
pub const TOKENS_FILE: &str = "tokens.json";
pub const LOG_FILE: &str = "lifeos.log";
