//! Cryptographic core for Lockleaf.
//!
//! This crate provides:
//! - Password digesting and (deliberately fast) key derivation
//! - Authenticated encryption using XChaCha20-Poly1305
//! - Session key lifecycle with automatic zeroization
//!
//! # Security Guarantees
//! - Key material is zeroized on drop
//! - No plaintext or key material is ever logged
//! - Every encryption call uses a fresh random nonce

pub mod engine;
pub mod keys;

pub use engine::{digest_password, CipherEngine, NONCE_SIZE, TAG_SIZE};
pub use keys::{Salt, SessionKey, KEY_LENGTH, SALT_LENGTH};
