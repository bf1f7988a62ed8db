//! Reconciliation of locally pending records with the remote service.
//!
//! A sync pass probes reachability, pushes pending reports and alerts,
//! marks whatever the server acknowledged, refreshes the resource directory
//! and republishes the snapshot.  Partial success is a normal end state:
//! unacknowledged records simply stay pending for the next pass.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use protectme_shared::protocol::{ResourceRecord, SyncAlertRequest, SyncReportRequest};
use protectme_shared::{AlertStatus, ReportStatus, SyncState};
use protectme_store::{Database, PendingAlert, Report, Resource, StoreError};

use crate::backend::SyncBackend;
use crate::error::ClientError;
use crate::local::LocalStore;
use crate::state::SnapshotPublisher;

/// Counters of one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub reports_synced: usize,
    pub reports_failed: usize,
    pub alerts_synced: usize,
    pub alerts_failed: usize,
    /// Resources written by the refresh (zero when the local list was kept).
    pub resources_refreshed: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another pass held the sync state; nothing was sent.
    AlreadyRunning,
    Completed(SyncSummary),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No network connection")]
    NoNetwork,

    #[error(transparent)]
    Store(#[from] ClientError),
}

#[derive(Clone)]
pub struct SyncOrchestrator {
    store: LocalStore,
    backend: Arc<dyn SyncBackend>,
    snapshot: SnapshotPublisher,
}

impl SyncOrchestrator {
    pub fn new(store: LocalStore, backend: Arc<dyn SyncBackend>, snapshot: SnapshotPublisher) -> Self {
        Self {
            store,
            backend,
            snapshot,
        }
    }

    /// Run one pass unless one is already in flight.
    ///
    /// Dropping the returned future mid-pass releases the sync state as
    /// `Error`, so a cancelled pass never blocks later ones.
    pub async fn sync_now(&self) -> SyncOutcome {
        if !self.snapshot.try_begin_sync() {
            info!("Sync already in progress, skipping");
            return SyncOutcome::AlreadyRunning;
        }
        let guard = SyncGuard::new(&self.snapshot);

        let started = Instant::now();
        match self.run().await {
            Ok(mut summary) => {
                summary.duration = started.elapsed();
                guard.finish(SyncState::Idle);
                info!(
                    reports_synced = summary.reports_synced,
                    reports_failed = summary.reports_failed,
                    alerts_synced = summary.alerts_synced,
                    alerts_failed = summary.alerts_failed,
                    resources_refreshed = summary.resources_refreshed,
                    duration_ms = summary.duration.as_millis() as u64,
                    "Sync completed"
                );
                SyncOutcome::Completed(summary)
            }
            Err(e) => {
                guard.finish(SyncState::Error);
                error!(
                    error = %e,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Sync failed"
                );
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self) -> Result<SyncSummary, SyncError> {
        if !self.backend.is_reachable().await {
            return Err(SyncError::NoNetwork);
        }

        let mut summary = SyncSummary::default();

        let reports = self
            .store
            .call(|db| db.list_reports_with_status(ReportStatus::Pending))
            .await?;
        if !reports.is_empty() {
            debug!(count = reports.len(), "Syncing pending reports");
            let batch = reports.iter().map(report_request).collect();
            let outcome = self.backend.sync_reports(batch).await;

            summary.reports_synced = outcome.synced.len();
            summary.reports_failed = outcome.failed.len();
            let acked: Vec<Report> = reports
                .into_iter()
                .filter(|r| outcome.synced.contains(&r.id))
                .collect();
            self.store.call(move |db| mark_reports_synced(db, &acked)).await?;
        }

        let alerts = self
            .store
            .call(|db| db.list_alerts_with_status(AlertStatus::Pending))
            .await?;
        if !alerts.is_empty() {
            debug!(count = alerts.len(), "Syncing pending alerts");
            let batch = alerts.iter().map(alert_request).collect();
            let outcome = self.backend.sync_alerts(batch).await;

            summary.alerts_synced = outcome.synced.len();
            summary.alerts_failed = outcome.failed.len();
            let resolved = outcome.synced;
            self.store.call(move |db| mark_alerts_resolved(db, &resolved)).await?;
        }

        match self.backend.fetch_resources().await {
            Ok(records) if !records.is_empty() => {
                let resources: Vec<Resource> = records.into_iter().map(resource_from_record).collect();
                summary.resources_refreshed = self
                    .store
                    .call(move |db| db.replace_resources(&resources))
                    .await?;
            }
            Ok(_) => debug!("Remote resource list empty, keeping local directory"),
            Err(e) => warn!(error = %e, "Resource refresh failed, keeping local directory"),
        }

        self.refresh_snapshot().await?;
        Ok(summary)
    }

    async fn refresh_snapshot(&self) -> Result<(), ClientError> {
        let (reports, alerts, resources) = self
            .store
            .call(|db| Ok((db.list_reports()?, db.list_pending_alerts()?, db.list_resources()?)))
            .await?;
        self.snapshot.update(|snap| {
            snap.reports = reports;
            snap.pending_alerts = alerts;
            snap.resources = resources;
        });
        Ok(())
    }
}

/// Releases the sync state when a pass ends without reaching
/// [`SyncGuard::finish`], e.g. because its future was dropped.
struct SyncGuard<'a> {
    snapshot: &'a SnapshotPublisher,
    armed: bool,
}

impl<'a> SyncGuard<'a> {
    fn new(snapshot: &'a SnapshotPublisher) -> Self {
        Self {
            snapshot,
            armed: true,
        }
    }

    fn finish(mut self, state: SyncState) {
        self.armed = false;
        self.snapshot.finish_sync(state);
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Sync cancelled before completion");
            self.snapshot.finish_sync(SyncState::Error);
        }
    }
}

// A record deleted while its request was in flight is not an error.  One
// edited in flight stays pending so the new content goes out next pass.
fn mark_reports_synced(db: &Database, sent: &[Report]) -> Result<(), StoreError> {
    for report in sent {
        match db.mark_report_synced(report) {
            Ok(true) => {}
            Ok(false) => debug!(id = report.id, "Report changed during sync, left pending"),
            Err(StoreError::NotFound) => debug!(id = report.id, "Synced report no longer exists"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn mark_alerts_resolved(db: &Database, ids: &[i64]) -> Result<(), StoreError> {
    for &id in ids {
        match db.set_alert_status(id, AlertStatus::Resolved) {
            Ok(_) => {}
            Err(StoreError::NotFound) => debug!(id, "Resolved alert no longer exists"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn report_request(report: &Report) -> SyncReportRequest {
    SyncReportRequest {
        id: report.id,
        title: report.title.clone(),
        description: report.description.clone(),
        is_anonymous: report.is_anonymous,
        created_at: report.created_at,
        updated_at: report.updated_at,
    }
}

fn alert_request(alert: &PendingAlert) -> SyncAlertRequest {
    SyncAlertRequest {
        id: alert.id,
        phone_number: alert.phone_number.clone(),
        created_at: alert.created_at,
    }
}

fn resource_from_record(record: ResourceRecord) -> Resource {
    Resource {
        id: record.id,
        name: record.name,
        category: record.category,
        phone: record.phone,
        address: record.address,
        latitude: record.latitude,
        longitude: record.longitude,
        is_open_24h: record.is_open_24h,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use protectme_shared::ResourceCategory;
    use protectme_store::ReportInput;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::RequestError;
    use crate::testing::ScriptedBackend;

    fn setup(backend: ScriptedBackend) -> (SyncOrchestrator, LocalStore, Arc<ScriptedBackend>, SnapshotPublisher) {
        let store = LocalStore::open_in_memory().unwrap();
        let backend = Arc::new(backend);
        let snapshot = SnapshotPublisher::new();
        let orchestrator = SyncOrchestrator::new(store.clone(), backend.clone(), snapshot.clone());
        (orchestrator, store, backend, snapshot)
    }

    async fn add_report(store: &LocalStore, title: &str, status: ReportStatus) -> i64 {
        let input = ReportInput {
            title: title.into(),
            description: "details".into(),
            ..Default::default()
        };
        store.call(move |db| db.upsert_report(&input, status)).await.unwrap()
    }

    fn record(id: i64, name: &str) -> ResourceRecord {
        ResourceRecord {
            id,
            name: name.into(),
            category: ResourceCategory::Legal,
            phone: "+254 700 000 001".into(),
            address: "Kisumu, Kenya".into(),
            latitude: None,
            longitude: None,
            is_open_24h: false,
        }
    }

    #[tokio::test]
    async fn partial_failure_leaves_failed_reports_pending() {
        let (orchestrator, store, backend, snapshot) = setup(ScriptedBackend::default());
        let a = add_report(&store, "a", ReportStatus::Pending).await;
        let b = add_report(&store, "b", ReportStatus::Pending).await;
        let c = add_report(&store, "c", ReportStatus::Pending).await;
        backend.fail_reports([b]);

        let SyncOutcome::Completed(summary) = orchestrator.sync_now().await else {
            panic!("sync did not complete");
        };
        assert_eq!(summary.reports_synced, 2);
        assert_eq!(summary.reports_failed, 1);

        let status = |id| {
            let store = store.clone();
            async move { store.call(move |db| db.get_report(id)).await.unwrap().unwrap().status }
        };
        assert_eq!(status(a).await, ReportStatus::Synced);
        assert_eq!(status(b).await, ReportStatus::Pending);
        assert_eq!(status(c).await, ReportStatus::Synced);

        let snap = snapshot.current();
        assert_eq!(snap.sync_state, SyncState::Idle);
        assert_eq!(
            snap.reports.iter().filter(|r| r.status == ReportStatus::Synced).count(),
            2
        );
    }

    #[tokio::test]
    async fn drafts_and_synced_reports_are_not_sent() {
        let (orchestrator, store, backend, _) = setup(ScriptedBackend::default());
        add_report(&store, "draft", ReportStatus::Draft).await;
        let pending = add_report(&store, "pending", ReportStatus::Pending).await;
        add_report(&store, "done", ReportStatus::Synced).await;

        orchestrator.sync_now().await;

        let sent: Vec<i64> = backend.sent_reports.lock().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(sent, vec![pending]);
    }

    #[tokio::test]
    async fn unreachable_backend_fails_without_sending() {
        let (orchestrator, store, backend, snapshot) = setup(ScriptedBackend::unreachable());
        add_report(&store, "a", ReportStatus::Pending).await;
        store.call(|db| db.create_pending_alert("112")).await.unwrap();

        let outcome = orchestrator.sync_now().await;
        assert_eq!(outcome, SyncOutcome::Failed("No network connection".into()));
        assert_eq!(snapshot.sync_state(), SyncState::Error);
        assert_eq!(backend.report_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.alert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nothing_pending_sends_nothing() {
        let (orchestrator, _, backend, _) = setup(ScriptedBackend::default());
        let outcome = orchestrator.sync_now().await;
        assert!(matches!(outcome, SyncOutcome::Completed(_)));
        assert_eq!(backend.report_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.alert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_sync_while_running_is_rejected() {
        let (backend, entered, release) = held();
        let (orchestrator, store, backend, snapshot) = setup(backend);
        add_report(&store, "a", ReportStatus::Pending).await;

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sync_now().await }
        });
        entered.notified().await;
        assert_eq!(snapshot.sync_state(), SyncState::Syncing);

        assert_eq!(orchestrator.sync_now().await, SyncOutcome::AlreadyRunning);

        release.notify_one();
        assert!(matches!(first.await.unwrap(), SyncOutcome::Completed(_)));
        assert_eq!(backend.report_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.probe_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn acknowledged_alerts_are_resolved() {
        let (orchestrator, store, backend, snapshot) = setup(ScriptedBackend::default());
        let ok = store.call(|db| db.create_pending_alert("112")).await.unwrap();
        let failing = store.call(|db| db.create_pending_alert("112")).await.unwrap();
        backend.fail_alerts([failing]);

        let SyncOutcome::Completed(summary) = orchestrator.sync_now().await else {
            panic!("sync did not complete");
        };
        assert_eq!(summary.alerts_synced, 1);
        assert_eq!(summary.alerts_failed, 1);

        let alerts = snapshot.current().pending_alerts;
        let status_of = |id| alerts.iter().find(|a| a.id == id).unwrap().status;
        assert_eq!(status_of(ok), AlertStatus::Resolved);
        assert_eq!(status_of(failing), AlertStatus::Pending);
    }

    #[tokio::test]
    async fn non_empty_resource_list_replaces_directory() {
        let (orchestrator, store, backend, snapshot) = setup(ScriptedBackend::default());
        backend.serve_resources(Ok(vec![record(7, "Kisumu Legal Aid")]));

        let SyncOutcome::Completed(summary) = orchestrator.sync_now().await else {
            panic!("sync did not complete");
        };
        assert_eq!(summary.resources_refreshed, 1);

        let stored = store.call(|db| db.list_resources()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 7);
        assert_eq!(snapshot.current().resources, stored);
    }

    #[tokio::test]
    async fn empty_or_failed_resource_fetch_keeps_directory() {
        let (orchestrator, store, backend, _) = setup(ScriptedBackend::default());
        let before = store.call(|db| db.list_resources()).await.unwrap();

        orchestrator.sync_now().await;
        assert_eq!(store.call(|db| db.list_resources()).await.unwrap(), before);

        backend.serve_resources(Err(RequestError::Timeout));
        let outcome = orchestrator.sync_now().await;
        assert!(matches!(outcome, SyncOutcome::Completed(_)));
        assert_eq!(store.call(|db| db.list_resources()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn report_deleted_mid_sync_is_tolerated() {
        let store = LocalStore::open_in_memory().unwrap();
        let id = add_report(&store, "gone", ReportStatus::Pending).await;
        let sent = store.call(move |db| db.get_report(id)).await.unwrap().unwrap();
        store.call(move |db| db.delete_report(id)).await.unwrap();

        store
            .call(move |db| mark_reports_synced(db, &[sent]))
            .await
            .unwrap();
    }

    fn held() -> (ScriptedBackend, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let backend = ScriptedBackend {
            hold: Some((entered.clone(), release.clone())),
            ..Default::default()
        };
        (backend, entered, release)
    }

    #[tokio::test]
    async fn report_edited_mid_sync_stays_pending_and_is_resent() {
        let (backend, entered, release) = held();
        let (orchestrator, store, backend, _) = setup(backend);
        let id = add_report(&store, "original", ReportStatus::Pending).await;

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sync_now().await }
        });
        entered.notified().await;

        let edit = ReportInput {
            id: Some(id),
            title: "edited".into(),
            description: "details".into(),
            ..Default::default()
        };
        store
            .call(move |db| db.upsert_report(&edit, ReportStatus::Pending))
            .await
            .unwrap();
        release.notify_one();
        assert!(matches!(first.await.unwrap(), SyncOutcome::Completed(_)));

        let local = store.call(move |db| db.get_report(id)).await.unwrap().unwrap();
        assert_eq!(local.title, "edited");
        assert_eq!(local.status, ReportStatus::Pending);

        // The permit lets the next held call through immediately.
        release.notify_one();
        orchestrator.sync_now().await;

        let sent: Vec<String> = backend
            .sent_reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.title.clone())
            .collect();
        assert_eq!(sent, vec!["original", "edited"]);
        let local = store.call(move |db| db.get_report(id)).await.unwrap().unwrap();
        assert_eq!(local.status, ReportStatus::Synced);
    }

    #[tokio::test]
    async fn cancelled_sync_releases_the_sync_state() {
        let (backend, entered, release) = held();
        let (orchestrator, store, backend, snapshot) = setup(backend);
        add_report(&store, "a", ReportStatus::Pending).await;

        let pass = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.sync_now().await }
        });
        entered.notified().await;
        assert_eq!(snapshot.sync_state(), SyncState::Syncing);

        pass.abort();
        assert!(pass.await.unwrap_err().is_cancelled());
        assert_eq!(snapshot.sync_state(), SyncState::Error);

        release.notify_one();
        let outcome = orchestrator.sync_now().await;
        assert!(matches!(outcome, SyncOutcome::Completed(_)));
        assert_eq!(snapshot.sync_state(), SyncState::Idle);
        assert_eq!(backend.report_calls.load(Ordering::SeqCst), 2);
    }
}
