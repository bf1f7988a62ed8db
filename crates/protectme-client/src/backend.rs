//! The seam between the sync orchestrator and the remote service.

use async_trait::async_trait;

use protectme_shared::protocol::{ResourceRecord, SyncAlertRequest, SyncReportRequest};

use crate::api::{BatchOutcome, RemoteClient, RequestError};

/// Remote operations the orchestrator needs.
///
/// Batch calls never fail as a whole: per-item failures are reported in
/// the returned [`BatchOutcome`].
#[async_trait]
pub trait SyncBackend: Send + Sync {
    async fn is_reachable(&self) -> bool;

    async fn sync_reports(&self, reports: Vec<SyncReportRequest>) -> BatchOutcome;

    async fn sync_alerts(&self, alerts: Vec<SyncAlertRequest>) -> BatchOutcome;

    async fn fetch_resources(&self) -> Result<Vec<ResourceRecord>, RequestError>;
}

#[async_trait]
impl SyncBackend for RemoteClient {
    async fn is_reachable(&self) -> bool {
        RemoteClient::is_reachable(self).await
    }

    async fn sync_reports(&self, reports: Vec<SyncReportRequest>) -> BatchOutcome {
        RemoteClient::sync_reports(self, &reports).await
    }

    async fn sync_alerts(&self, alerts: Vec<SyncAlertRequest>) -> BatchOutcome {
        RemoteClient::sync_alerts(self, &alerts).await
    }

    async fn fetch_resources(&self) -> Result<Vec<ResourceRecord>, RequestError> {
        RemoteClient::fetch_resources(self).await
    }
}
