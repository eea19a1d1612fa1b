use keyring::Entry;
use log::{debug, warn};

use super::credentials::CredentialPair;
use super::token_store::{StoreError, TokenStore};
use crate::{ACCESS_TOKEN_KEY, KEYRING_SERVICE, REFRESH_TOKEN_KEY};

/// Token store backed by the system keyring.
/// Each token lives in its own entry under the `lifeos` service.
pub struct KeyringTokenStore {
    access: Entry,
    refresh: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::with_service(KEYRING_SERVICE)
    }

    /// Use a custom service name, e.g. one per API host
    pub fn with_service(service: &str) -> Result<Self, StoreError> {
        let access = Entry::new(service, ACCESS_TOKEN_KEY).map_err(keyring_error)?;
        let refresh = Entry::new(service, REFRESH_TOKEN_KEY).map_err(keyring_error)?;
        Ok(Self::from_entries(access, refresh))
    }

    fn from_entries(access: Entry, refresh: Entry) -> Self {
        Self { access, refresh }
    }

    fn read(entry: &Entry) -> Option<String> {
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!("Keyring read failed: {}", e);
                None
            }
        }
    }

    fn remove(entry: &Entry) -> Result<(), StoreError> {
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error(e)),
        }
    }
}

fn keyring_error(e: keyring::Error) -> StoreError {
    StoreError::Keyring(e.to_string())
}

impl TokenStore for KeyringTokenStore {
    fn set(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let written = self
            .refresh
            .set_password(&pair.refresh)
            .and_then(|()| self.access.set_password(&pair.access));
        if let Err(e) = written {
            // Never leave one new token next to one old token
            if let Err(cleanup) = self.clear() {
                warn!("Failed to clear keyring after partial write: {}", cleanup);
            }
            return Err(keyring_error(e));
        }
        Ok(())
    }

    fn access_token(&self) -> Option<String> {
        Self::read(&self.access)
    }

    fn refresh_token(&self) -> Option<String> {
        Self::read(&self.refresh)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Self::remove(&self.access)?;
        Self::remove(&self.refresh)
    }
}
