//! Vault catalog for Lockleaf.
//!
//! This crate provides:
//! - The vault record (name, storage directory, encrypted flag,
//!   last-opened time)
//! - The persistent registry of known vaults with current-vault
//!   selection and new-vault bootstrap

pub mod catalog;
pub mod model;

pub use catalog::{default_registry_path, VaultCatalog, REGISTRY_FILE};
pub use model::Vault;
