//! Error types for the client crate.

use thiserror::Error;

use protectme_store::StoreError;

use crate::api::RequestError;
use crate::preferences::PreferenceError;
use crate::validation::ValidationError;

/// Errors returned by facade actions.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before anything was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Local store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Persisted flag could not be written.
    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferenceError),

    /// The HTTP client could not be constructed.
    #[error("Remote client error: {0}")]
    Remote(#[from] RequestError),

    /// A blocking store task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    /// The store mutex was poisoned by a panicking writer.
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Failures from device collaborators (dialer, biometrics).
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Call could not be placed: {0}")]
    CallFailed(String),
}
