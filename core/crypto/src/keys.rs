//! Key and salt types with secure memory handling.
//!
//! The session key automatically zeroizes its memory on drop so key
//! material does not persist after sign-out.

use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the symmetric session key in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the key-derivation salt in bytes (128-bit).
pub const SALT_LENGTH: usize = 16;

/// Symmetric key held in memory for the duration of an unlocked session.
///
/// Exactly one session key is resident at a time (owned by the
/// `CipherEngine`); it is zeroized on drop, so clearing the engine's
/// current key is sufficient to remove it from memory.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_LENGTH],
}

impl SessionKey {
    /// Create a session key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Create a session key from a byte slice.
    ///
    /// Returns `None` if the slice is not exactly KEY_LENGTH bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let key: [u8; KEY_LENGTH] = bytes.try_into().ok()?;
        Some(Self { key })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

/// Salt for password hashing and key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice.
    ///
    /// Returns `None` if the slice is not exactly SALT_LENGTH bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let salt: [u8; SALT_LENGTH] = bytes.try_into().ok()?;
        Some(Self(salt))
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}
