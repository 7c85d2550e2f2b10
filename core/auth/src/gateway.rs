//! Credential lifecycle and session unlocking.
//!
//! The gateway owns setup and verification of the password credential,
//! biometric-gated retrieval of the escrowed key, and decides when the
//! shared cipher engine holds a session key. Per the engine's failure
//! contract every outcome is a boolean: failures are logged where they
//! happen, never surfaced as error values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::biometric::BiometricAuthenticator;
use crate::credentials::{CredentialStore, ENCRYPTION_KEY, PASSWORD_HASH, PASSWORD_SALT};
use lockleaf_crypto::{digest_password, CipherEngine, Salt, SessionKey};

/// Gateway between the credential store, the biometric facility and the
/// shared cipher engine.
///
/// The session is "unlocked" exactly while the engine holds a key;
/// there is no separate state to keep in sync.
pub struct AuthGateway {
    credentials: Arc<dyn CredentialStore>,
    biometric: Arc<dyn BiometricAuthenticator>,
    cipher: Arc<CipherEngine>,
    challenge_in_flight: AtomicBool,
}

impl AuthGateway {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        biometric: Arc<dyn BiometricAuthenticator>,
        cipher: Arc<CipherEngine>,
    ) -> Self {
        Self {
            credentials,
            biometric,
            cipher,
            challenge_in_flight: AtomicBool::new(false),
        }
    }

    fn fetch(&self, name: &str) -> Option<Vec<u8>> {
        match self.credentials.retrieve(name) {
            Ok(value) => value,
            Err(e) => {
                warn!("credential lookup failed for {}: {}", name, e);
                None
            }
        }
    }

    /// Whether a password credential has been set up.
    pub fn has_credential(&self) -> bool {
        self.fetch(PASSWORD_HASH).is_some() && self.fetch(PASSWORD_SALT).is_some()
    }

    /// Whether a session key is currently resident.
    pub fn is_unlocked(&self) -> bool {
        self.cipher.has_key()
    }

    /// Set up the password credential, replacing any existing one.
    ///
    /// Generates a fresh salt, persists hash and salt, derives and
    /// installs the session key. With `escrow` set, the key is
    /// additionally stored for later biometric retrieval. Rejects the
    /// empty password.
    pub fn setup_credential(&self, password: &str, escrow: bool) -> bool {
        if password.is_empty() {
            return false;
        }

        let salt = self.cipher.generate_salt();
        let hash = digest_password(password, &salt);

        if let Err(e) = self.credentials.store(PASSWORD_HASH, &hash) {
            warn!("failed to store password hash: {}", e);
            return false;
        }
        if let Err(e) = self.credentials.store(PASSWORD_SALT, salt.as_bytes()) {
            warn!("failed to store salt: {}", e);
            return false;
        }

        let Some(key) = self.cipher.derive_key(password, &salt) else {
            return false;
        };

        if escrow {
            if let Err(e) = self.credentials.store(ENCRYPTION_KEY, key.as_bytes()) {
                warn!("failed to escrow session key: {}", e);
            }
        }

        self.cipher.set_current_key(key);
        info!("credential configured");
        true
    }

    /// Check a password against the stored credential.
    ///
    /// On a match the session key is derived and installed. Every
    /// failure mode (no credential, wrong password, empty input) is
    /// `false`.
    pub fn verify_credential(&self, password: &str) -> bool {
        let Some(stored_hash) = self.fetch(PASSWORD_HASH) else {
            return false;
        };
        let Some(salt_bytes) = self.fetch(PASSWORD_SALT) else {
            return false;
        };
        let Some(salt) = Salt::from_slice(&salt_bytes) else {
            warn!("stored salt has unexpected length");
            return false;
        };

        let computed = digest_password(password, &salt);
        if !bool::from(computed.as_slice().ct_eq(stored_hash.as_slice())) {
            return false;
        }

        let Some(key) = self.cipher.derive_key(password, &salt) else {
            return false;
        };
        self.cipher.set_current_key(key);
        true
    }

    /// Whether biometric unlock can succeed right now.
    ///
    /// Requires both the platform capability and a previously escrowed
    /// key; a biometric pass without an escrow has nothing to install.
    pub fn biometric_available(&self) -> bool {
        self.biometric.is_available() && self.fetch(ENCRYPTION_KEY).is_some()
    }

    /// Run a biometric challenge; on a pass, install the escrowed key.
    ///
    /// At most one challenge is in flight: a concurrent call fails
    /// immediately instead of queueing.
    pub async fn authenticate_biometric(&self) -> bool {
        if self
            .challenge_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("biometric challenge already in flight");
            return false;
        }

        let unlocked = self.run_biometric_challenge().await;
        self.challenge_in_flight.store(false, Ordering::SeqCst);
        unlocked
    }

    async fn run_biometric_challenge(&self) -> bool {
        let passed = match self
            .biometric
            .authenticate("Unlock your Lockleaf vault")
            .await
        {
            Ok(passed) => passed,
            Err(e) => {
                warn!("biometric challenge failed: {}", e);
                false
            }
        };
        if !passed {
            return false;
        }

        let Some(key_bytes) = self.fetch(ENCRYPTION_KEY) else {
            warn!("biometric check passed but no escrowed key is stored");
            return false;
        };
        let Some(key) = SessionKey::from_slice(&key_bytes) else {
            warn!("escrowed key has unexpected length");
            return false;
        };

        self.cipher.set_current_key(key);
        info!("unlocked via biometric challenge");
        true
    }

    /// Clear the session key. Credentials and escrow remain in place.
    pub fn sign_out(&self) {
        self.cipher.clear_current_key();
        info!("signed out, session key cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometric::{StaticBiometrics, UnsupportedBiometrics};
    use crate::credentials::MemoryStore;
    use std::time::Duration;

    fn gateway_with(biometric: Arc<dyn BiometricAuthenticator>) -> AuthGateway {
        AuthGateway::new(
            Arc::new(MemoryStore::new()),
            biometric,
            Arc::new(CipherEngine::new()),
        )
    }

    fn gateway() -> AuthGateway {
        gateway_with(Arc::new(UnsupportedBiometrics))
    }

    #[test]
    fn test_setup_then_verify() {
        let gateway = gateway();

        assert!(!gateway.has_credential());
        assert!(gateway.setup_credential("secret", false));
        assert!(gateway.has_credential());

        gateway.sign_out();
        assert!(gateway.verify_credential("secret"));
        assert!(!gateway.verify_credential("wrong"));
        assert!(!gateway.verify_credential(""));
    }

    #[test]
    fn test_setup_rejects_empty_password() {
        let gateway = gateway();

        assert!(!gateway.setup_credential("", false));
        assert!(!gateway.has_credential());
        assert!(!gateway.is_unlocked());
    }

    #[test]
    fn test_setup_unlocks_session() {
        let gateway = gateway();

        assert!(gateway.setup_credential("secret", false));
        assert!(gateway.is_unlocked());
    }

    #[test]
    fn test_sign_out_locks_session() {
        let gateway = gateway();
        gateway.setup_credential("secret", false);

        gateway.sign_out();

        assert!(!gateway.is_unlocked());
        // Credential survives sign-out.
        assert!(gateway.has_credential());
        assert!(gateway.verify_credential("secret"));
    }

    #[test]
    fn test_verify_without_credential_fails() {
        let gateway = gateway();
        assert!(!gateway.verify_credential("anything"));
    }

    #[test]
    fn test_resetup_regenerates_salt() {
        let credentials = Arc::new(MemoryStore::new());
        let gateway = AuthGateway::new(
            credentials.clone(),
            Arc::new(UnsupportedBiometrics),
            Arc::new(CipherEngine::new()),
        );

        gateway.setup_credential("secret", false);
        let first_salt = credentials.retrieve(PASSWORD_SALT).unwrap().unwrap();

        gateway.setup_credential("secret", false);
        let second_salt = credentials.retrieve(PASSWORD_SALT).unwrap().unwrap();

        assert_ne!(first_salt, second_salt);
        // The fresh credential still verifies.
        assert!(gateway.verify_credential("secret"));
    }

    #[test]
    fn test_escrow_opt_in() {
        let credentials = Arc::new(MemoryStore::new());
        let gateway = AuthGateway::new(
            credentials.clone(),
            Arc::new(UnsupportedBiometrics),
            Arc::new(CipherEngine::new()),
        );

        gateway.setup_credential("secret", false);
        assert!(credentials.retrieve(ENCRYPTION_KEY).unwrap().is_none());

        gateway.setup_credential("secret", true);
        let escrowed = credentials.retrieve(ENCRYPTION_KEY).unwrap().unwrap();
        assert_eq!(escrowed.len(), 32);
    }

    #[test]
    fn test_biometric_available_requires_escrow() {
        let gateway = gateway_with(Arc::new(StaticBiometrics::granting()));

        gateway.setup_credential("secret", false);
        assert!(!gateway.biometric_available());

        gateway.setup_credential("secret", true);
        assert!(gateway.biometric_available());
    }

    #[test]
    fn test_biometric_available_requires_platform_support() {
        let gateway = gateway();
        gateway.setup_credential("secret", true);

        assert!(!gateway.biometric_available());
    }

    #[tokio::test]
    async fn test_biometric_unlock_installs_escrowed_key() {
        let gateway = gateway_with(Arc::new(StaticBiometrics::granting()));
        gateway.setup_credential("secret", true);
        gateway.sign_out();

        assert!(gateway.authenticate_biometric().await);
        assert!(gateway.is_unlocked());
    }

    #[tokio::test]
    async fn test_denied_biometric_stays_locked() {
        let gateway = gateway_with(Arc::new(StaticBiometrics::denying()));
        gateway.setup_credential("secret", true);
        gateway.sign_out();

        assert!(!gateway.authenticate_biometric().await);
        assert!(!gateway.is_unlocked());
    }

    #[tokio::test]
    async fn test_biometric_without_escrow_fails() {
        let gateway = gateway_with(Arc::new(StaticBiometrics::granting()));
        gateway.setup_credential("secret", false);
        gateway.sign_out();

        assert!(!gateway.authenticate_biometric().await);
        assert!(!gateway.is_unlocked());
    }

    #[tokio::test]
    async fn test_malformed_escrow_fails() {
        let credentials = Arc::new(MemoryStore::new());
        let gateway = AuthGateway::new(
            credentials.clone(),
            Arc::new(StaticBiometrics::granting()),
            Arc::new(CipherEngine::new()),
        );
        credentials.store(ENCRYPTION_KEY, b"short").unwrap();

        assert!(!gateway.authenticate_biometric().await);
        assert!(!gateway.is_unlocked());
    }

    #[tokio::test]
    async fn test_single_challenge_in_flight() {
        let gateway = gateway_with(Arc::new(
            StaticBiometrics::granting().with_delay(Duration::from_millis(50)),
        ));
        gateway.setup_credential("secret", true);
        gateway.sign_out();

        let (first, second) =
            tokio::join!(gateway.authenticate_biometric(), gateway.authenticate_biometric());

        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn test_challenge_can_rerun_after_completion() {
        let gateway = gateway_with(Arc::new(StaticBiometrics::granting()));
        gateway.setup_credential("secret", true);
        gateway.sign_out();

        assert!(gateway.authenticate_biometric().await);
        gateway.sign_out();
        assert!(gateway.authenticate_biometric().await);
    }
}
