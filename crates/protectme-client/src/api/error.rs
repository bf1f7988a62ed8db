use thiserror::Error;

/// Outcome classification for a failed remote call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The call exceeded its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request never produced a response (connection refused, reset,
    /// DNS failure).
    #[error("Network request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },

    /// The response body was not what the endpoint promises.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The request could not be built (bad URL, unserializable body).
    #[error("Invalid request: {0}")]
    Build(String),
}

impl RequestError {
    /// Timeouts and transport failures are worth retrying; anything the
    /// server actually answered is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_builder() {
            Self::Build(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}
