//! Scripted collaborators shared by the client's unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use protectme_shared::protocol::{ResourceRecord, SyncAlertRequest, SyncReportRequest};

use crate::api::{BatchOutcome, RequestError};
use crate::backend::SyncBackend;
use crate::error::PlatformError;
use crate::platform::{BiometricAuthenticator, EmergencyDialer, Platform, UserNotifier};

/// A [`SyncBackend`] whose answers are set up by the test.
pub struct ScriptedBackend {
    pub reachable: AtomicBool,
    pub failing_reports: Mutex<HashSet<i64>>,
    pub failing_alerts: Mutex<HashSet<i64>>,
    pub resources: Mutex<Result<Vec<ResourceRecord>, RequestError>>,
    pub probe_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub alert_calls: AtomicUsize,
    pub sent_reports: Mutex<Vec<SyncReportRequest>>,
    /// When set, `sync_reports` signals `entered` and waits on `release`.
    pub hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            failing_reports: Mutex::new(HashSet::new()),
            failing_alerts: Mutex::new(HashSet::new()),
            resources: Mutex::new(Ok(Vec::new())),
            probe_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
            alert_calls: AtomicUsize::new(0),
            sent_reports: Mutex::new(Vec::new()),
            hold: None,
        }
    }
}

impl ScriptedBackend {
    pub fn unreachable() -> Self {
        let backend = Self::default();
        backend.reachable.store(false, Ordering::SeqCst);
        backend
    }

    pub fn fail_reports(&self, ids: impl IntoIterator<Item = i64>) {
        self.failing_reports.lock().unwrap().extend(ids);
    }

    pub fn fail_alerts(&self, ids: impl IntoIterator<Item = i64>) {
        self.failing_alerts.lock().unwrap().extend(ids);
    }

    pub fn serve_resources(&self, resources: Result<Vec<ResourceRecord>, RequestError>) {
        *self.resources.lock().unwrap() = resources;
    }

    fn split(ids: Vec<i64>, failing: &HashSet<i64>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            if failing.contains(&id) {
                outcome.failed.push(id);
                outcome.errors.push(format!("{id}: HTTP 500"));
            } else {
                outcome.synced.push(id);
            }
        }
        outcome
    }
}

#[async_trait]
impl SyncBackend for ScriptedBackend {
    async fn is_reachable(&self) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.reachable.load(Ordering::SeqCst)
    }

    async fn sync_reports(&self, reports: Vec<SyncReportRequest>) -> BatchOutcome {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        let ids = reports.iter().map(|r| r.id).collect();
        self.sent_reports.lock().unwrap().extend(reports);
        let failing = self.failing_reports.lock().unwrap().clone();
        Self::split(ids, &failing)
    }

    async fn sync_alerts(&self, alerts: Vec<SyncAlertRequest>) -> BatchOutcome {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        let ids = alerts.iter().map(|a| a.id).collect();
        let failing = self.failing_alerts.lock().unwrap().clone();
        Self::split(ids, &failing)
    }

    async fn fetch_resources(&self) -> Result<Vec<ResourceRecord>, RequestError> {
        self.resources.lock().unwrap().clone()
    }
}

/// Dialer, biometrics and notifier with fixed answers that record calls.
#[derive(Default)]
pub struct FakeDevice {
    pub can_dial: bool,
    pub dial_fails: bool,
    pub has_hardware: bool,
    pub enrolled: bool,
    pub approves: bool,
    pub dialed: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<(String, String)>>,
}

impl FakeDevice {
    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            dialer: self.clone(),
            biometrics: self.clone(),
            notifier: self.clone(),
        }
    }

    pub fn alert_titles(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

#[async_trait]
impl EmergencyDialer for FakeDevice {
    async fn can_dial(&self, _number: &str) -> bool {
        self.can_dial
    }

    async fn dial(&self, number: &str) -> Result<(), PlatformError> {
        if self.dial_fails {
            return Err(PlatformError::CallFailed("line busy".into()));
        }
        self.dialed.lock().unwrap().push(number.to_string());
        Ok(())
    }
}

#[async_trait]
impl BiometricAuthenticator for FakeDevice {
    async fn has_hardware(&self) -> bool {
        self.has_hardware
    }

    async fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    async fn authenticate(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.approves
    }
}

impl UserNotifier for FakeDevice {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
