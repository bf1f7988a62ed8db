//! HTTP client for the remote sync service.
//!
//! Every call carries the shared `x-api-key` credential and a per-request
//! timeout.  Retryable failures (timeouts, transport errors) are retried with
//! bounded exponential backoff inside [`RemoteClient::request`]; batch calls
//! turn whatever is left into per-item failures instead of errors, so one bad
//! record never blocks the rest.  This module never touches the local store.

mod error;
mod retry;

use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use protectme_shared::constants::{
    ALERTS_SYNC_PATH, API_KEY_HEADER, HEALTH_PATH, REPORTS_SYNC_PATH, RESOURCES_PATH,
};
use protectme_shared::protocol::{ResourceRecord, SyncAck, SyncAlertRequest, SyncReportRequest};

use crate::config::ClientConfig;

pub use error::RequestError;
pub use retry::RetryPolicy;

/// Per-item result of a batch sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Local ids acknowledged by the server.
    pub synced: Vec<i64>,
    /// Local ids that were not delivered.
    pub failed: Vec<i64>,
    /// One message per failed id, in the same order.
    pub errors: Vec<String>,
}

impl BatchOutcome {
    fn record(&mut self, kind: &str, id: i64, result: Result<SyncAck, RequestError>) {
        match result {
            Ok(ack) => {
                debug!(kind, id, remote_id = %ack.id, "record synced");
                self.synced.push(id);
            }
            Err(e) => {
                warn!(kind, id, error = %e, "record sync failed");
                self.failed.push(id);
                self.errors.push(format!("{kind} {id}: {e}"));
            }
        }
    }
}

/// Result of [`RemoteClient::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub available: bool,
    pub latency: Duration,
    pub error: Option<String>,
}

/// Client for the remote sync service.
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    api_key: String,
    probe_timeout: Duration,
    request_timeout: Duration,
    retry: RetryPolicy,
    report_batch_size: usize,
}

impl RemoteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RequestError> {
        let http = Client::builder()
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            probe_timeout: config.probe_timeout,
            request_timeout: config.request_timeout,
            retry: config.retry,
            report_batch_size: config.report_batch_size.max(1),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Liveness probe against `/health`.  Never fails: any transport error
    /// or non-2xx answer reads as unreachable.
    pub async fn is_reachable(&self) -> bool {
        let url = self.url(HEALTH_PATH);
        match self.http.get(&url).timeout(self.probe_timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "reachability probe failed");
                false
            }
        }
    }

    /// Poll [`Self::is_reachable`] once per second until it succeeds or
    /// `max_wait` elapses.
    pub async fn wait_for_connection(&self, max_wait: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        loop {
            if self.is_reachable().await {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_secs(1).min(deadline - now)).await;
        }
    }

    /// Issue one call, retrying retryable failures per the retry policy.
    /// Each retry re-sends the identical request.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut attempt = 0u32;
        loop {
            match self.send_once(method.clone(), endpoint, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.attempts => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    info!(
                        endpoint,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        attempt,
                        max_attempts = self.retry.attempts,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(endpoint, error = %e, "API request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn send_once<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut req = self
            .http
            .request(method, self.url(endpoint))
            .timeout(self.request_timeout)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Deliver reports independently, a bounded group at a time.
    pub async fn sync_reports(&self, reports: &[SyncReportRequest]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for group in reports.chunks(self.report_batch_size) {
            let results = join_all(group.iter().map(|report| {
                self.request::<SyncAck, _>(Method::POST, REPORTS_SYNC_PATH, Some(report))
            }))
            .await;

            for (report, result) in group.iter().zip(results) {
                outcome.record("Report", report.id, result);
            }
        }

        outcome
    }

    /// Deliver alerts one after another.
    pub async fn sync_alerts(&self, alerts: &[SyncAlertRequest]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for alert in alerts {
            let result = self
                .request::<SyncAck, _>(Method::POST, ALERTS_SYNC_PATH, Some(alert))
                .await;
            outcome.record("Alert", alert.id, result);
        }
        outcome
    }

    /// Latest resource directory.  The caller decides whether to apply it.
    pub async fn fetch_resources(&self) -> Result<Vec<ResourceRecord>, RequestError> {
        self.request::<Vec<ResourceRecord>, ()>(Method::GET, RESOURCES_PATH, None)
            .await
    }

    /// Round-trip `/health` through the retrying path and time it.
    pub async fn test_connection(&self) -> ConnectionReport {
        let started = Instant::now();
        let result = self
            .request::<serde_json::Value, ()>(Method::GET, HEALTH_PATH, None)
            .await;
        ConnectionReport {
            available: result.is_ok(),
            latency: started.elapsed(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}
