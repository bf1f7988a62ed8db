//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the demo server can start with
//! zero configuration next to a local client.

use std::fmt;
use std::net::SocketAddr;

use protectme_shared::constants::{DEFAULT_HTTP_PORT, DEMO_API_KEY};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR` (full address) or `PORT` (port on all interfaces)
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Shared key every non-public request must carry in `x-api-key`.
    /// Env: `API_KEY`
    /// Default: `demo-api-key`
    pub api_key: String,

    /// Probability that `POST /reports/sync` answers 500.
    /// Env: `REPORT_FAILURE_RATE` (0.0 - 1.0)
    /// Default: `0.05`
    pub report_failure_rate: f64,

    /// Probability that `POST /alerts/sync` answers 500.
    /// Env: `ALERT_FAILURE_RATE` (0.0 - 1.0)
    /// Default: `0.03`
    pub alert_failure_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            api_key: DEMO_API_KEY.to_string(),
            report_failure_rate: 0.05,
            alert_failure_rate: 0.03,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("api_key", &"<redacted>")
            .field("report_failure_rate", &self.report_failure_rate)
            .field("alert_failure_rate", &self.alert_failure_rate)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(key) = std::env::var("API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        if let Ok(val) = std::env::var("REPORT_FAILURE_RATE") {
            match parse_rate(&val) {
                Some(rate) => config.report_failure_rate = rate,
                None => tracing::warn!(value = %val, "Invalid REPORT_FAILURE_RATE, using default"),
            }
        }

        if let Ok(val) = std::env::var("ALERT_FAILURE_RATE") {
            match parse_rate(&val) {
                Some(rate) => config.alert_failure_rate = rate,
                None => tracing::warn!(value = %val, "Invalid ALERT_FAILURE_RATE, using default"),
            }
        }

        config
    }
}

/// A probability in `[0, 1]`.
fn parse_rate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| (0.0..=1.0).contains(rate))
}
