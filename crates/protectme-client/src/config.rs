//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration against the demo server.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use protectme_shared::constants::{
    DEFAULT_API_URL, DEFAULT_SOS_NUMBER, DEMO_API_KEY, PROBE_TIMEOUT_SECS, REPORT_BATCH_SIZE,
    REQUEST_TIMEOUT_SECS,
};
use protectme_store::StoreError;

use crate::api::RetryPolicy;

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the remote sync service.
    /// Env: `PROTECTME_API_URL`
    pub api_url: String,

    /// Shared static credential sent as `x-api-key`.
    /// Env: `PROTECTME_API_KEY`
    pub api_key: String,

    /// Timeout of the reachability probe.
    pub probe_timeout: Duration,

    /// Overall timeout of a single data call.
    /// Env: `PROTECTME_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Duration,

    /// Backoff for retryable failures.
    /// Env: `PROTECTME_RETRY_ATTEMPTS`
    pub retry: RetryPolicy,

    /// Reports delivered per group during a sync pass.
    pub report_batch_size: usize,

    /// Number dialed by the SOS action.
    /// Env: `PROTECTME_SOS_NUMBER`
    pub sos_number: String,

    /// Directory holding the database and the preference file.
    /// Env: `PROTECTME_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: DEMO_API_KEY.to_string(),
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            report_batch_size: REPORT_BATCH_SIZE,
            sos_number: DEFAULT_SOS_NUMBER.to_string(),
            data_dir: None,
        }
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("probe_timeout", &self.probe_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("report_batch_size", &self.report_batch_size)
            .field("sos_number", &self.sos_number)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PROTECTME_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = url.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(value = %url, "Invalid PROTECTME_API_URL, using default");
            }
        }

        if let Ok(key) = std::env::var("PROTECTME_API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        if let Ok(val) = std::env::var("PROTECTME_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid PROTECTME_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        if let Ok(val) = std::env::var("PROTECTME_RETRY_ATTEMPTS") {
            if let Ok(n) = val.parse::<u32>() {
                config.retry.attempts = n;
            }
        }

        if let Ok(number) = std::env::var("PROTECTME_SOS_NUMBER") {
            if !number.trim().is_empty() {
                config.sos_number = number.trim().to_string();
            }
        }

        if let Ok(dir) = std::env::var("PROTECTME_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// The configured data directory, or the platform default.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, StoreError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => protectme_store::database::default_data_dir(),
        }
    }
}
