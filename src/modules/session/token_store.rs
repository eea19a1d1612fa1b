use log::{debug, warn};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::credentials::CredentialPair;
use crate::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Errors raised while persisting credentials
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Token file error: {0}")]
    Io(#[from] io::Error),

    #[error("Token file is corrupt: {0}")]
    Corrupt(String),

    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Process-wide holder for the access/refresh token pair.
///
/// Implementations must make `set` look atomic to callers: a reader never sees
/// the new access token paired with the old refresh token or the reverse.
pub trait TokenStore: Send + Sync {
    /// Overwrite both tokens
    fn set(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Remove every stored key
    fn clear(&self) -> Result<(), StoreError>;
}

pub type SharedTokenStore = Arc<dyn TokenStore>;

/// In-memory store, lost when the process exits
#[derive(Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(ACCESS_TOKEN_KEY.to_string(), pair.access.clone());
        values.insert(REFRESH_TOKEN_KEY.to_string(), pair.refresh.clone());
        Ok(())
    }

    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// Key-value JSON document on disk.
///
/// The whole document is rewritten through a sibling temp file and renamed
/// into place, so both keys change together.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write_document(&self, document: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp_path = self.path.with_extension("tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Token file written to {}", self.path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.read_document() {
            Ok(mut document) => document.remove(key),
            Err(e) => {
                warn!("Failed to read token file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn set(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let mut document = HashMap::new();
        document.insert(ACCESS_TOKEN_KEY.to_string(), pair.access.clone());
        document.insert(REFRESH_TOKEN_KEY.to_string(), pair.refresh.clone());
        self.write_document(&document)
    }

    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());

        store.set(&CredentialPair::new("a1", "r1")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        // Replaced wholesale
        store.set(&CredentialPair::new("a2", "r2")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r2"));

        store.clear().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let store = FileTokenStore::new(&path);
        store.set(&CredentialPair::new("a1", "r1")).unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.access_token().as_deref(), Some("a1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("r1"));

        let raw: HashMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("access_token").map(String::as_str), Some("a1"));
        assert_eq!(raw.get("refresh_token").map(String::as_str), Some("r1"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::new(&path);

        // Clearing an empty store is fine
        assert!(store.clear().is_ok());

        store.set(&CredentialPair::new("a1", "r1")).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.access_token().is_none());

        // A fresh login overwrites the damaged document
        store.set(&CredentialPair::new("a1", "r1")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        FileTokenStore::new(&path)
            .set(&CredentialPair::new("a1", "r1"))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
