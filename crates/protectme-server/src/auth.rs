use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use protectme_shared::constants::{API_KEY_HEADER, HEALTH_PATH, METRICS_PATH};

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Paths reachable without a key.
const PUBLIC_PATHS: [&str; 2] = [HEALTH_PATH, METRICS_PATH];

/// Reject requests whose `x-api-key` does not match the configured key.
pub async fn require_api_key(
    State(config): State<Arc<ServerConfig>>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !keys_match(provided, &config.api_key) {
        warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
        return Err(ServerError::Unauthorized);
    }

    Ok(next.run(req).await)
}

// Constant-time comparison; an empty key never matches.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    !provided.is_empty()
        && provided.len() == expected.len()
        && provided.ct_eq(expected).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("demo-api-key", "demo-api-key"));
        assert!(!keys_match("demo-api-kex", "demo-api-key"));
        assert!(!keys_match("demo", "demo-api-key"));
        assert!(!keys_match("", ""));
    }
}
