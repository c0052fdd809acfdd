//! The credential collaborator: passphrases live in a local secure secret
//! store and never leave the client.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{AppError, Result};

/// Service name under which passphrases are filed in the OS keyring.
pub const KEYRING_SERVICE: &str = "vaultd";

pub trait CredentialSource: Send + Sync {
    fn get_passphrase(&self, username: &str) -> Result<String>;
    fn set_passphrase(&self, username: &str, value: &str) -> Result<()>;
}

/// OS-keyring-backed credentials.
pub struct KeyringCredentials {
    service: String,
}

impl KeyringCredentials {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }
}

impl Default for KeyringCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for KeyringCredentials {
    fn get_passphrase(&self, username: &str) -> Result<String> {
        let entry = keyring::Entry::new(&self.service, username)
            .map_err(|e| AppError::Internal(format!("keyring init: {e}")))?;
        entry.get_password().map_err(|e| {
            AppError::Authentication(format!("no stored passphrase for {username}: {e}"))
        })
    }

    fn set_passphrase(&self, username: &str, value: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, username)
            .map_err(|e| AppError::Internal(format!("keyring init: {e}")))?;
        entry
            .set_password(value)
            .map_err(|e| AppError::Internal(format!("keyring write: {e}")))
    }
}

/// In-memory credentials for tests and headless environments without a
/// secret service.
#[derive(Default)]
pub struct MemoryCredentials {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialSource for MemoryCredentials {
    fn get_passphrase(&self, username: &str) -> Result<String> {
        self.entries
            .read()
            .expect("credential lock poisoned")
            .get(username)
            .cloned()
            .ok_or_else(|| {
                AppError::Authentication(format!("no stored passphrase for {username}"))
            })
    }

    fn set_passphrase(&self, username: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .expect("credential lock poisoned")
            .insert(username.to_string(), value.to_string());
        Ok(())
    }
}
