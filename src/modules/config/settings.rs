use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::modules::session::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, SharedTokenStore, StoreError,
};
use crate::{APP_NAME, CONFIG_FILE, DEFAULT_API_URL, LOG_FILE, TOKENS_FILE};

pub const ENV_API_URL: &str = "LIFEOS_API_URL";
pub const ENV_TOKEN_BACKEND: &str = "LIFEOS_TOKEN_BACKEND";
pub const ENV_DATA_DIR: &str = "LIFEOS_DATA_DIR";
pub const ENV_LOG: &str = "LIFEOS_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No data directory available; set {}", ENV_DATA_DIR)]
    NoDataDir,

    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Token store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Where credentials are persisted between runs
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenBackend::File => "file",
            TokenBackend::Keyring => "keyring",
            TokenBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

impl FromStr for TokenBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" => Ok(TokenBackend::Keyring),
            "memory" => Ok(TokenBackend::Memory),
            other => Err(format!("unknown backend '{}', expected file/keyring/memory", other)),
        }
    }
}

/// Configuration structure for the client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub token_backend: TokenBackend,
    /// Directory holding this file; not stored in it
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            token_backend: TokenBackend::File,
            data_dir: PathBuf::new(),
            log_file: None,
            log_level: "info".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load from the platform data dir with environment overrides applied
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let data_dir = match lookup(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let mut config = Self::load_from(&data_dir)?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Read `config.json` from `data_dir`, falling back to defaults when absent
    pub fn load_from(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str::<AppConfig>(&data).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            AppConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// Apply `LIFEOS_*` values supplied by `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(backend) = lookup(ENV_TOKEN_BACKEND) {
            self.token_backend = backend.parse().map_err(|message| ConfigError::Invalid {
                key: ENV_TOKEN_BACKEND,
                message,
            })?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Save configuration as pretty JSON
    pub fn save(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.data_dir)?;
        let data = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: self.config_path(),
            message: e.to_string(),
        })?;
        fs::write(self.config_path(), data)?;
        info!("Saved configuration to {}", self.config_path().display());
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.data_dir.join(TOKENS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_FILE))
    }

    /// Level for the file logger; unparsable filters fall back to info
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build the token store selected by `token_backend`
    pub fn token_store(&self) -> Result<SharedTokenStore, ConfigError> {
        let store: SharedTokenStore = match self.token_backend {
            TokenBackend::File => Arc::new(FileTokenStore::new(self.tokens_path())),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()?),
            TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .map(|dir| dir.join(APP_NAME))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.token_backend, TokenBackend::File);
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.tokens_path(), dir.path().join(TOKENS_FILE));
        assert_eq!(config.log_path(), dir.path().join(LOG_FILE));
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::load_from(dir.path()).unwrap();
        config.api_base_url = "https://lifeos.example.com/api".to_string();
        config.token_backend = TokenBackend::Keyring;
        config.request_timeout_secs = 5;
        config.save().unwrap();

        let saved = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(saved.contains("\"token_backend\": \"keyring\""));
        assert!(!saved.contains("data_dir"));

        let reloaded = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"log_level": "debug"}"#).unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();

        assert!(matches!(
            AppConfig::load_from(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://10.0.0.2:8000/api"),
            (ENV_TOKEN_BACKEND, "Memory"),
            (ENV_LOG, "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url, "http://10.0.0.2:8000/api");
        assert_eq!(config.token_backend, TokenBackend::Memory);
        assert_eq!(config.level_filter(), LevelFilter::Warn);

        let err = config
            .apply_overrides(|key| (key == ENV_TOKEN_BACKEND).then(|| "vault".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TOKEN_BACKEND));
    }

    #[test]
    fn test_memory_backend_store() {
        let config = AppConfig {
            token_backend: TokenBackend::Memory,
            ..AppConfig::default()
        };
        let store = config.token_store().unwrap();
        assert!(store.access_token().is_none());
    }
}
