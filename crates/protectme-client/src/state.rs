//! In-memory application snapshot shared with the UI.
//!
//! The [`AppSnapshot`] is owned by a `watch` channel.  Readers get clones;
//! only the facade and the sync orchestrator write to it, always through
//! [`SnapshotPublisher`].

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use protectme_shared::SyncState;
use protectme_store::{PendingAlert, Report, Resource};

/// Everything the UI renders.  Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    /// Newest first.
    pub reports: Vec<Report>,
    /// Name-ascending.
    pub resources: Vec<Resource>,
    /// Newest first, all statuses.
    pub pending_alerts: Vec<PendingAlert>,
    pub sync_state: SyncState,
    pub has_completed_onboarding: bool,
    pub pin_enabled: bool,
    pub biometric_enabled: bool,
    pub is_authenticated: bool,
    /// `true` until the first load from the store finishes.
    pub loading: bool,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
            resources: Vec::new(),
            pending_alerts: Vec::new(),
            sync_state: SyncState::Idle,
            has_completed_onboarding: false,
            pin_enabled: false,
            biometric_enabled: false,
            is_authenticated: false,
            loading: true,
        }
    }
}

/// Write half of the snapshot channel.
#[derive(Clone)]
pub struct SnapshotPublisher {
    tx: Arc<watch::Sender<AppSnapshot>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AppSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Move from any non-syncing state to `Syncing`.  Returns `false` if a
    /// sync already holds the state; the check and the write happen under
    /// the channel lock.
    pub fn try_begin_sync(&self) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.sync_state == SyncState::Syncing {
                false
            } else {
                snap.sync_state = SyncState::Syncing;
                true
            }
        })
    }

    pub fn finish_sync(&self, state: SyncState) {
        self.update(|snap| snap.sync_state = state);
    }

    /// Apply `f` and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut AppSnapshot)) {
        self.tx.send_modify(f);
    }

    pub fn current(&self) -> AppSnapshot {
        self.tx.borrow().clone()
    }

    pub fn sync_state(&self) -> SyncState {
        self.tx.borrow().sync_state
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
