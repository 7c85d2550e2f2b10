//! Biometric challenge abstraction.
//!
//! A challenge is a single-completion asynchronous operation with no
//! cancellation; the gateway enforces that at most one is in flight.

use async_trait::async_trait;
use std::time::Duration;

use lockleaf_common::Result;

/// Platform biometric check (Touch ID, Windows Hello, fingerprint...).
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Whether the platform can evaluate a biometric challenge at all.
    fn is_available(&self) -> bool;

    /// Run one biometric challenge and resolve to pass/fail.
    async fn authenticate(&self, reason: &str) -> Result<bool>;
}

/// Authenticator for platforms without a biometric facility.
pub struct UnsupportedBiometrics;

#[async_trait]
impl BiometricAuthenticator for UnsupportedBiometrics {
    fn is_available(&self) -> bool {
        false
    }

    async fn authenticate(&self, _reason: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Authenticator with a fixed outcome and optional artificial delay.
///
/// Stands in for the platform check in tests.
pub struct StaticBiometrics {
    outcome: bool,
    delay: Option<Duration>,
}

impl StaticBiometrics {
    /// Every challenge passes.
    pub fn granting() -> Self {
        Self {
            outcome: true,
            delay: None,
        }
    }

    /// Every challenge fails.
    pub fn denying() -> Self {
        Self {
            outcome: false,
            delay: None,
        }
    }

    /// Delay each challenge, e.g. to hold it in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl BiometricAuthenticator for StaticBiometrics {
    fn is_available(&self) -> bool {
        true
    }

    async fn authenticate(&self, _reason: &str) -> Result<bool> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.outcome)
    }
}
