/// Header carrying the shared static API credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Credential accepted by the demo server when none is configured
pub const DEMO_API_KEY: &str = "demo-api-key";

/// Default remote service base URL
pub const DEFAULT_API_URL: &str = "https://api.protectme.example.com";

/// Emergency number dialed by the SOS action
pub const DEFAULT_SOS_NUMBER: &str = "112";

/// Maximum report title length, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum report description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Reachability probe timeout in seconds
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Overall timeout for data calls in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retries after the first attempt for retryable failures
pub const RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Ceiling for a single backoff delay in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Reports delivered per group during a sync pass
pub const REPORT_BATCH_SIZE: usize = 5;

/// Remote endpoints
pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";
pub const REPORTS_SYNC_PATH: &str = "/reports/sync";
pub const ALERTS_SYNC_PATH: &str = "/alerts/sync";
pub const RESOURCES_PATH: &str = "/resources";

/// Default HTTP port for the demo server
pub const DEFAULT_HTTP_PORT: u16 = 3000;
