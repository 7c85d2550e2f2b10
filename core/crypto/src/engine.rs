//! Authenticated encryption engine with session key lifecycle.
//!
//! The engine holds at most one symmetric key for the active session and
//! performs XChaCha20-Poly1305 encryption/decryption of byte buffers and
//! serializable objects. Failures collapse to `None` with a log side
//! effect; callers treat a missing result as "no data".

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, generic_array::GenericArray},
    XChaCha20Poly1305,
};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::sync::RwLock;
use tracing::warn;

use crate::keys::{Salt, SessionKey, KEY_LENGTH};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Round count reserved for a slow password-based KDF (PBKDF2/Argon2).
///
/// Key derivation currently runs a single SHA-256 pass over
/// `password ++ salt`; this constant marks the intended upgrade path
/// behind [`CipherEngine::derive_key`].
#[allow(dead_code)]
const KEY_DERIVATION_ROUNDS: u32 = 100_000;

/// One-way digest over `password ++ salt`.
///
/// This is the shared derivation used for both the stored credential hash
/// and the session key. Deterministic: the same `(password, salt)` pair
/// always yields the same digest.
pub fn digest_password(password: &str, salt: &Salt) -> [u8; KEY_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.finalize().into()
}

/// Encryption engine holding the session key for the active session.
///
/// One engine instance is shared (`Arc<CipherEngine>`) between the auth
/// gateway, which installs and clears the key, and every collection
/// store, which reads it for load/save operations.
pub struct CipherEngine {
    current_key: RwLock<Option<SessionKey>>,
}

impl CipherEngine {
    /// Create an engine with no resident key (locked state).
    pub fn new() -> Self {
        Self {
            current_key: RwLock::new(None),
        }
    }

    /// Generate a fresh random salt for key derivation.
    pub fn generate_salt(&self) -> Salt {
        Salt::generate()
    }

    /// Derive a session key from a password and salt.
    ///
    /// Returns `None` for an empty password. The derivation is a single
    /// SHA-256 pass, not a deliberately slow KDF; see
    /// `KEY_DERIVATION_ROUNDS`.
    pub fn derive_key(&self, password: &str, salt: &Salt) -> Option<SessionKey> {
        if password.is_empty() {
            return None;
        }
        Some(SessionKey::from_bytes(digest_password(password, salt)))
    }

    /// Install the session key, replacing any previously resident key.
    pub fn set_current_key(&self, key: SessionKey) {
        *self.current_key.write().unwrap() = Some(key);
    }

    /// Remove the session key from memory.
    ///
    /// The dropped key zeroizes itself, so it is not recoverable after
    /// this call returns.
    pub fn clear_current_key(&self) {
        self.current_key.write().unwrap().take();
    }

    /// Whether a session key is currently resident.
    pub fn has_key(&self) -> bool {
        self.current_key.read().unwrap().is_some()
    }

    /// Encrypt a byte buffer with the resident session key.
    ///
    /// Returns `(ciphertext, nonce)`. A fresh random nonce is generated
    /// per call, so identical plaintexts produce different ciphertexts.
    /// Returns `None` (and logs) if no key is set or encryption fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        let guard = self.current_key.read().unwrap();
        let Some(key) = guard.as_ref() else {
            warn!("encryption failed: no session key installed");
            return None;
        };

        let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        match cipher.encrypt(&nonce, plaintext) {
            Ok(ciphertext) => Some((ciphertext, nonce.to_vec())),
            Err(e) => {
                warn!("encryption failed: {}", e);
                None
            }
        }
    }

    /// Decrypt a byte buffer with the resident session key.
    ///
    /// Returns `None` if no key is set, the nonce has the wrong length,
    /// or authentication fails (wrong key or tampered ciphertext). A
    /// failed decryption never yields corrupted plaintext.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> Option<Vec<u8>> {
        let guard = self.current_key.read().unwrap();
        let Some(key) = guard.as_ref() else {
            warn!("decryption failed: no session key installed");
            return None;
        };

        if nonce.len() != NONCE_SIZE {
            warn!(len = nonce.len(), "decryption failed: unexpected nonce length");
            return None;
        }

        let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));

        match cipher.decrypt(GenericArray::from_slice(nonce), ciphertext) {
            Ok(plaintext) => Some(plaintext),
            Err(_) => {
                warn!("decryption failed: authentication error");
                None
            }
        }
    }

    /// Serialize an object to JSON and encrypt it.
    pub fn encrypt_object<T: Serialize>(&self, value: &T) -> Option<(Vec<u8>, Vec<u8>)> {
        match serde_json::to_vec(value) {
            Ok(plaintext) => self.encrypt(&plaintext),
            Err(e) => {
                warn!("object encoding failed: {}", e);
                None
            }
        }
    }

    /// Decrypt a buffer and deserialize the plaintext from JSON.
    pub fn decrypt_object<T: DeserializeOwned>(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Option<T> {
        let plaintext = self.decrypt(ciphertext, nonce)?;
        match serde_json::from_slice(&plaintext) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("object decoding failed: {}", e);
                None
            }
        }
    }
}

impl Default for CipherEngine {
    fn default() -> Self {
        Self::new()
    }
}
