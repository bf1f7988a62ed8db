//! Device collaborators the facade talks to: the phone dialer, the
//! biometric prompt and user-facing alerts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlatformError;

#[async_trait]
pub trait EmergencyDialer: Send + Sync {
    async fn can_dial(&self, number: &str) -> bool;

    async fn dial(&self, number: &str) -> Result<(), PlatformError>;
}

#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    async fn has_hardware(&self) -> bool;

    async fn is_enrolled(&self) -> bool;

    /// Show a confirmation prompt.  `false` means the user declined or the
    /// check failed.
    async fn authenticate(&self, prompt: &str) -> bool;
}

pub trait UserNotifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// The collaborators bundled for the facade.
#[derive(Clone)]
pub struct Platform {
    pub dialer: Arc<dyn EmergencyDialer>,
    pub biometrics: Arc<dyn BiometricAuthenticator>,
    pub notifier: Arc<dyn UserNotifier>,
}

impl Platform {
    /// A platform with no dialer, no biometric hardware and a logging notifier.
    pub fn headless() -> Self {
        let headless = Arc::new(HeadlessPlatform);
        Self {
            dialer: headless.clone(),
            biometrics: headless.clone(),
            notifier: headless,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::headless()
    }
}

/// Stand-in used by the command-line binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPlatform;

#[async_trait]
impl EmergencyDialer for HeadlessPlatform {
    async fn can_dial(&self, _number: &str) -> bool {
        false
    }

    async fn dial(&self, number: &str) -> Result<(), PlatformError> {
        Err(PlatformError::CallFailed(format!(
            "no dialer available for {number}"
        )))
    }
}

#[async_trait]
impl BiometricAuthenticator for HeadlessPlatform {
    async fn has_hardware(&self) -> bool {
        false
    }

    async fn is_enrolled(&self) -> bool {
        false
    }

    async fn authenticate(&self, _prompt: &str) -> bool {
        false
    }
}

impl UserNotifier for HeadlessPlatform {
    fn alert(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "user alert");
    }
}
