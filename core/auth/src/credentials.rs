//! Secure credential storage.
//!
//! Opaque key/value storage for the password hash, the derivation salt
//! and the optional escrowed session key. The platform-backed
//! implementation routes through the OS credential store; an in-memory
//! implementation backs tests and headless environments.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::sync::RwLock;

use lockleaf_common::{Error, Result};

/// Service identifier namespacing all secure-store entries.
pub const SERVICE_NAME: &str = "lockleaf";

/// Entry name for the stored password hash.
pub const PASSWORD_HASH: &str = "password-hash";

/// Entry name for the key-derivation salt.
pub const PASSWORD_SALT: &str = "password-salt";

/// Entry name for the escrowed session key (biometric unlock).
pub const ENCRYPTION_KEY: &str = "encryption-key";

/// Opaque secure key/value storage keyed by entry name.
pub trait CredentialStore: Send + Sync {
    /// Store a value, replacing any existing entry of the same name.
    fn store(&self, name: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a value; a missing entry is `Ok(None)`, not an error.
    fn retrieve(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Remove an entry; removing a missing entry succeeds.
    fn remove(&self, name: &str) -> Result<()>;
}

/// Credential store backed by the platform keyring.
///
/// Values are base64-encoded since the keyring stores strings.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a non-default service name (separate namespaces).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, name)
            .map_err(|e| Error::Credential(format!("keyring init: {e}")))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn store(&self, name: &str, value: &[u8]) -> Result<()> {
        self.entry(name)?
            .set_password(&STANDARD.encode(value))
            .map_err(|e| Error::Credential(format!("store {name}: {e}")))
    }

    fn retrieve(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(name)?.get_password() {
            Ok(encoded) => {
                let decoded = STANDARD
                    .decode(encoded)
                    .map_err(|e| Error::Credential(format!("decode {name}: {e}")))?;
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Credential(format!("load {name}: {e}"))),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Credential(format!("remove {name}: {e}"))),
        }
    }
}

/// In-memory credential store.
///
/// All entries are lost on drop. Used in tests and environments without
/// a platform keyring.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryStore {
    fn store(&self, name: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn retrieve(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().unwrap().get(name).cloned())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.entries.write().unwrap().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        store.store(PASSWORD_HASH, b"digest").unwrap();
        assert_eq!(
            store.retrieve(PASSWORD_HASH).unwrap(),
            Some(b"digest".to_vec())
        );
    }

    #[test]
    fn test_memory_store_missing_entry_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.retrieve(ENCRYPTION_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryStore::new();

        store.store(PASSWORD_SALT, b"old").unwrap();
        store.store(PASSWORD_SALT, b"new").unwrap();

        assert_eq!(
            store.retrieve(PASSWORD_SALT).unwrap(),
            Some(b"new".to_vec())
        );
    }

    #[test]
    fn test_memory_store_remove_is_idempotent() {
        let store = MemoryStore::new();

        store.store(ENCRYPTION_KEY, b"key").unwrap();
        store.remove(ENCRYPTION_KEY).unwrap();
        store.remove(ENCRYPTION_KEY).unwrap();

        assert_eq!(store.retrieve(ENCRYPTION_KEY).unwrap(), None);
    }
}
