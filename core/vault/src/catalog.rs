//! Registry of known vaults and current-vault selection.
//!
//! The registry is one JSON list persisted in the platform config
//! directory, independent of any vault's own storage directory. It is
//! loaded once at construction and rewritten after every mutation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::model::Vault;
use lockleaf_crypto::CipherEngine;
use lockleaf_store::{CollectionStore, FOLDERS_FILE, LINKS_FILE, NOTES_FILE};

/// Registry file name inside the config directory.
pub const REGISTRY_FILE: &str = "vaults.json";

/// Default location of the vault registry.
pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lockleaf")
        .join(REGISTRY_FILE)
}

/// Catalog of known vaults with current-vault selection.
pub struct VaultCatalog {
    vaults: Vec<Vault>,
    current: Option<Vault>,
    registry_path: PathBuf,
}

impl VaultCatalog {
    /// Open the catalog at the default registry location.
    pub fn open_default() -> Self {
        Self::open(default_registry_path())
    }

    /// Open the catalog backed by a specific registry file.
    ///
    /// A missing or unreadable registry is an empty catalog.
    pub fn open(registry_path: impl Into<PathBuf>) -> Self {
        let registry_path = registry_path.into();
        let vaults = Self::load_registry(&registry_path);
        Self {
            vaults,
            current: None,
            registry_path,
        }
    }

    fn load_registry(path: &Path) -> Vec<Vault> {
        if !path.exists() {
            return Vec::new();
        }
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                error!(path = %path.display(), "failed to read vault registry: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_slice(&data) {
            Ok(vaults) => vaults,
            Err(e) => {
                error!(path = %path.display(), "failed to decode vault registry: {}", e);
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        if let Some(parent) = self.registry_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("failed to create registry directory: {}", e);
                return;
            }
        }
        let data = match serde_json::to_vec_pretty(&self.vaults) {
            Ok(data) => data,
            Err(e) => {
                error!("failed to encode vault registry: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.registry_path, data) {
            error!(path = %self.registry_path.display(), "failed to write vault registry: {}", e);
        }
    }

    /// All registered vaults.
    pub fn list_vaults(&self) -> &[Vault] {
        &self.vaults
    }

    /// The currently selected vault, if any.
    pub fn current_vault(&self) -> Option<&Vault> {
        self.current.as_ref()
    }

    /// Register a vault. A vault with the same id is not added twice.
    pub fn add_vault(&mut self, vault: Vault) {
        if !self.vaults.iter().any(|v| v.id == vault.id) {
            self.vaults.push(vault);
            self.persist();
        }
    }

    /// Remove a vault from the registry. Its directory is left in place.
    pub fn remove_vault(&mut self, id: Uuid) {
        self.vaults.retain(|v| v.id != id);
        self.persist();
    }

    /// Select a vault, stamping its last-opened time.
    pub fn set_current_vault(&mut self, vault: &Vault) {
        self.current = Some(vault.clone());
        if let Some(entry) = self.vaults.iter_mut().find(|v| v.id == vault.id) {
            entry.last_opened = Some(Utc::now());
            self.persist();
        }
    }

    /// Create a vault directory, bootstrap its collection files, and
    /// register the vault.
    ///
    /// The three collection files are created and then overwritten with
    /// empty encrypted collections, so subsequent loads see "empty"
    /// rather than "missing". Should the directory creation fail, the
    /// vault is still constructed and returned but never registered;
    /// the failure only shows up in the log and the missing registry
    /// entry.
    pub fn create_vault(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        encrypted: bool,
        cipher: Arc<CipherEngine>,
    ) -> Vault {
        let vault = Vault::new(name, path, encrypted);

        if let Err(e) = fs::create_dir_all(&vault.path) {
            error!(path = %vault.path.display(), "failed to create vault directory: {}", e);
            return vault;
        }

        for file in [NOTES_FILE, LINKS_FILE, FOLDERS_FILE] {
            let file_path = vault.path.join(file);
            if !file_path.exists() {
                if let Err(e) = fs::File::create(&file_path) {
                    warn!(path = %file_path.display(), "failed to create collection file: {}", e);
                }
            }
        }

        let store = CollectionStore::with_vault_dir(cipher, &vault.path);
        store.save_notes(&[]);
        store.save_links(&[]);
        store.save_folders(&[]);

        info!(name = %vault.name, path = %vault.path.display(), "vault created");
        self.add_vault(vault.clone());
        vault
    }
}
