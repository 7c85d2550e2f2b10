//! Vault record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use uuid::Uuid;

/// A registered vault: an independent storage directory holding one full
/// set of encrypted collections.
///
/// Identity is the `id`; two records with the same id compare equal
/// regardless of their other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub is_encrypted: bool,
    /// Stamped by the catalog whenever this vault is selected.
    pub last_opened: Option<DateTime<Utc>>,
}

impl Vault {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, is_encrypted: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            is_encrypted,
            last_opened: None,
        }
    }
}

impl PartialEq for Vault {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vault {}

impl Hash for Vault {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
