//! Authentication and credential management for Lockleaf.
//!
//! This crate provides:
//! - Opaque secure credential storage (platform keyring or in-memory)
//! - The biometric challenge abstraction
//! - The auth gateway orchestrating credential checks and the session
//!   key held by the shared cipher engine

pub mod biometric;
pub mod credentials;
pub mod gateway;

pub use biometric::{BiometricAuthenticator, StaticBiometrics, UnsupportedBiometrics};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore, SERVICE_NAME};
pub use gateway::AuthGateway;
