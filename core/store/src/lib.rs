//! Encrypted collection storage for Lockleaf.
//!
//! This crate provides:
//! - The entity model (notes, links, folders) and the unified item feed
//! - The on-disk frame format for encrypted collection files
//! - The per-vault collection store with cascading folder cleanup and
//!   change notifications

pub mod collections;
pub mod frame;
pub mod model;

pub use collections::{CollectionStore, FOLDERS_FILE, LINKS_FILE, NOTES_FILE};
pub use frame::EncryptedFrame;
pub use model::{Color, Folder, Item, Link, Note, VaultItem};
