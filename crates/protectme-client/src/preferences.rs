//! Persisted on/off flags that live outside the relational tables.
//!
//! Flags are stored as a flat JSON object keyed by stable strings, next to
//! the database.  A missing or unreadable file reads as every flag off.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;

pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    OnboardingComplete,
    PinEnabled,
    BiometricEnabled,
    Authenticated,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnboardingComplete => "@protectme/onboarding-complete",
            Self::PinEnabled => "@protectme/pin-enabled",
            Self::BiometricEnabled => "@protectme/biometric-enabled",
            Self::Authenticated => "@protectme/authenticated",
        }
    }
}

/// All flags at once, as loaded at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub has_completed_onboarding: bool,
    pub pin_enabled: bool,
    pub biometric_enabled: bool,
    pub is_authenticated: bool,
}

pub struct PreferenceStore {
    /// `None` for the in-memory variant.
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, bool>>,
}

impl PreferenceStore {
    /// Load `preferences.json` from `dir`.
    pub async fn open(dir: &Path) -> Self {
        let path = dir.join(PREFERENCES_FILE);
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt preferences file, using defaults");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read preferences, using defaults");
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, key: PreferenceKey) -> bool {
        self.values
            .lock()
            .await
            .get(key.as_str())
            .copied()
            .unwrap_or(false)
    }

    /// Persist `value` under `key`.  The in-memory value only changes once
    /// the file write succeeded.
    pub async fn set(&self, key: PreferenceKey, value: bool) -> Result<(), PreferenceError> {
        self.write_with(key, |_| value).await.map(|_| ())
    }

    /// Flip `key` and return the new value.  Concurrent toggles never read
    /// the same old value.
    pub async fn toggle(&self, key: PreferenceKey) -> Result<bool, PreferenceError> {
        self.write_with(key, |current| !current).await
    }

    /// Write `next` only if `key` still holds `expected`.  Returns the value
    /// stored afterwards.
    pub async fn compare_and_set(
        &self,
        key: PreferenceKey,
        expected: bool,
        next: bool,
    ) -> Result<bool, PreferenceError> {
        self.write_with(key, |current| if current == expected { next } else { current })
            .await
    }

    async fn write_with(
        &self,
        key: PreferenceKey,
        f: impl FnOnce(bool) -> bool,
    ) -> Result<bool, PreferenceError> {
        let mut values = self.values.lock().await;
        let value = f(values.get(key.as_str()).copied().unwrap_or(false));
        let mut next = values.clone();
        next.insert(key.as_str().to_string(), value);

        if let Some(path) = &self.path {
            write_atomically(path, &next).await?;
        }
        *values = next;

        tracing::debug!(key = key.as_str(), value, "preference updated");
        Ok(value)
    }

    pub async fn load(&self) -> Preferences {
        Preferences {
            has_completed_onboarding: self.get(PreferenceKey::OnboardingComplete).await,
            pin_enabled: self.get(PreferenceKey::PinEnabled).await,
            biometric_enabled: self.get(PreferenceKey::BiometricEnabled).await,
            is_authenticated: self.get(PreferenceKey::Authenticated).await,
        }
    }
}

async fn write_atomically(path: &Path, values: &BTreeMap<String, bool>) -> Result<(), PreferenceError> {
    let json = serde_json::to_vec_pretty(values)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
