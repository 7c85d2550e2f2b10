//! Common error types for Lockleaf.

use thiserror::Error;

/// Top-level error type for Lockleaf operations.
///
/// Most user-facing operations deliberately do not return this type:
/// credential checks collapse to booleans and cipher operations to
/// `Option`, per the storage engine's failure contract. `Error` is used
/// by the plumbing underneath (credential store, registry persistence).
#[derive(Debug, Error)]
pub enum Error {
    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Secure credential storage failed.
    #[error("Credential store error: {0}")]
    Credential(String),

    /// Vault catalog or bootstrap operation failed.
    #[error("Vault error: {0}")]
    Vault(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
