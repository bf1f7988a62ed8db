//! The application facade.
//!
//! [`ProtectMe`] owns the local store, the preference flags, the device
//! collaborators and the sync orchestrator.  UI code reads snapshots and
//! calls actions; it never touches the store directly.  Every mutating
//! action re-reads the affected collection and republishes it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use protectme_shared::ReportStatus;
use protectme_store::{Report, ReportInput};

use crate::api::RemoteClient;
use crate::backend::SyncBackend;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::local::LocalStore;
use crate::platform::Platform;
use crate::preferences::{PreferenceKey, PreferenceStore};
use crate::state::{AppSnapshot, SnapshotPublisher};
use crate::sync::{SyncOrchestrator, SyncOutcome};
use crate::validation::validate_report;

const BIOMETRIC_PROMPT: &str = "Enable biometric lock";

/// Result of [`ProtectMe::trigger_sos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosOutcome {
    pub alert_id: i64,
    pub call_placed: bool,
}

#[derive(Clone)]
pub struct ProtectMe {
    store: LocalStore,
    preferences: Arc<PreferenceStore>,
    platform: Platform,
    snapshot: SnapshotPublisher,
    sync: SyncOrchestrator,
    sos_number: String,
}

impl ProtectMe {
    /// Open the on-disk store and preferences in the configured data
    /// directory and publish the first snapshot.
    pub async fn start(config: ClientConfig, platform: Platform) -> Result<Self, ClientError> {
        let data_dir = config.resolve_data_dir()?;
        let store = LocalStore::open(&data_dir).await?;
        let preferences = PreferenceStore::open(&data_dir).await;
        let backend = Arc::new(RemoteClient::new(&config)?);

        let app = Self::with_parts(store, preferences, backend, platform, &config);
        app.load().await?;

        info!(data_dir = %data_dir.display(), api_url = %config.api_url, "ProtectMe started");
        Ok(app)
    }

    pub fn with_parts(
        store: LocalStore,
        preferences: PreferenceStore,
        backend: Arc<dyn SyncBackend>,
        platform: Platform,
        config: &ClientConfig,
    ) -> Self {
        let snapshot = SnapshotPublisher::new();
        let sync = SyncOrchestrator::new(store.clone(), backend, snapshot.clone());
        Self {
            store,
            preferences: Arc::new(preferences),
            platform,
            snapshot,
            sync,
            sos_number: config.sos_number.clone(),
        }
    }

    /// Populate the snapshot from the store and the preference flags.
    pub async fn load(&self) -> Result<(), ClientError> {
        let prefs = self.preferences.load().await;
        let (reports, resources, alerts) = self
            .store
            .call(|db| Ok((db.list_reports()?, db.list_resources()?, db.list_pending_alerts()?)))
            .await?;

        self.snapshot.update(|snap| {
            snap.reports = reports;
            snap.resources = resources;
            snap.pending_alerts = alerts;
            snap.has_completed_onboarding = prefs.has_completed_onboarding;
            snap.pin_enabled = prefs.pin_enabled;
            snap.biometric_enabled = prefs.biometric_enabled;
            snap.is_authenticated = prefs.is_authenticated;
            snap.loading = false;
        });
        Ok(())
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.snapshot.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.snapshot.subscribe()
    }

    /// Validate and submit a report as pending.  Passing the id of a draft
    /// submits that draft.
    pub async fn create_report(&self, input: ReportInput) -> Result<i64, ClientError> {
        let (title, description) = validate_report(&input.title, &input.description)?;
        let input = ReportInput {
            title,
            description,
            ..input
        };
        let id = self
            .store
            .call(move |db| db.upsert_report(&input, ReportStatus::Pending))
            .await?;
        info!(id, "Report submitted");

        self.refresh_reports().await?;
        Ok(id)
    }

    /// Save without validation; empty fields are allowed.
    pub async fn save_draft(&self, input: ReportInput) -> Result<i64, ClientError> {
        let id = self
            .store
            .call(move |db| db.upsert_report(&input, ReportStatus::Draft))
            .await?;
        self.refresh_reports().await?;
        Ok(id)
    }

    pub async fn delete_report(&self, id: i64) -> Result<bool, ClientError> {
        let deleted = self.store.call(move |db| db.delete_report(id)).await?;
        self.refresh_reports().await?;
        Ok(deleted)
    }

    /// Mark a report synced without contacting the server.
    pub async fn mark_synced(&self, id: i64) -> Result<bool, ClientError> {
        let changed = self
            .store
            .call(move |db| db.set_report_status(id, ReportStatus::Synced))
            .await?;
        self.refresh_reports().await?;
        Ok(changed)
    }

    pub async fn load_report_for_edit(&self, id: i64) -> Result<Option<Report>, ClientError> {
        self.store.call(move |db| db.get_report(id)).await
    }

    /// Record an SOS alert, then try to place the emergency call.  The
    /// alert is kept whether or not the call goes through.
    pub async fn trigger_sos(&self) -> Result<SosOutcome, ClientError> {
        let number = self.sos_number.clone();
        let alert_id = {
            let number = number.clone();
            self.store
                .call(move |db| db.create_pending_alert(&number))
                .await?
        };
        warn!(alert_id, number = %number, "SOS triggered");
        self.refresh_alerts().await?;

        let dialer = &self.platform.dialer;
        let call_placed = if dialer.can_dial(&number).await {
            match dialer.dial(&number).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Emergency call failed");
                    false
                }
            }
        } else {
            false
        };

        if !call_placed {
            self.platform.notifier.alert(
                "Unable to place call",
                &format!("Please dial {number} manually."),
            );
        }

        Ok(SosOutcome {
            alert_id,
            call_placed,
        })
    }

    pub async fn sync_now(&self) -> SyncOutcome {
        self.sync.sync_now().await
    }

    pub async fn complete_onboarding(&self) -> Result<(), ClientError> {
        self.preferences
            .set(PreferenceKey::OnboardingComplete, true)
            .await?;
        self.snapshot.update(|snap| snap.has_completed_onboarding = true);
        Ok(())
    }

    /// Flip the PIN lock flag and return the new value.
    pub async fn toggle_pin_lock(&self) -> Result<bool, ClientError> {
        let next = self.preferences.toggle(PreferenceKey::PinEnabled).await?;
        self.snapshot.update(|snap| snap.pin_enabled = next);
        info!(enabled = next, "PIN lock changed");
        Ok(next)
    }

    /// Flip the biometric lock flag and return the resulting value.
    ///
    /// Enabling needs hardware, an enrolled credential and a confirmed
    /// prompt.  If any check fails the flag is left as it was.
    pub async fn toggle_biometric(&self) -> Result<bool, ClientError> {
        let current = self.preferences.get(PreferenceKey::BiometricEnabled).await;

        if !current {
            let biometrics = &self.platform.biometrics;
            if !biometrics.has_hardware().await {
                self.platform.notifier.alert(
                    "Biometric unavailable",
                    "Your device does not support biometric authentication.",
                );
                return Ok(current);
            }
            if !biometrics.is_enrolled().await {
                self.platform.notifier.alert(
                    "Biometric unavailable",
                    "Please enroll a fingerprint or face ID first.",
                );
                return Ok(current);
            }
            if !biometrics.authenticate(BIOMETRIC_PROMPT).await {
                return Ok(current);
            }
        }

        let next = self
            .preferences
            .compare_and_set(PreferenceKey::BiometricEnabled, current, !current)
            .await?;
        self.snapshot.update(|snap| snap.biometric_enabled = next);
        info!(enabled = next, "Biometric lock changed");
        Ok(next)
    }

    /// Demo sign-in: no credentials are checked.
    pub async fn sign_in(&self) -> Result<(), ClientError> {
        self.set_authenticated(true).await
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.set_authenticated(false).await
    }

    async fn set_authenticated(&self, value: bool) -> Result<(), ClientError> {
        self.preferences
            .set(PreferenceKey::Authenticated, value)
            .await?;
        self.snapshot.update(|snap| snap.is_authenticated = value);
        Ok(())
    }

    async fn refresh_reports(&self) -> Result<(), ClientError> {
        let reports = self.store.call(|db| db.list_reports()).await?;
        self.snapshot.update(|snap| snap.reports = reports);
        Ok(())
    }

    async fn refresh_alerts(&self) -> Result<(), ClientError> {
        let alerts = self.store.call(|db| db.list_pending_alerts()).await?;
        self.snapshot.update(|snap| snap.pending_alerts = alerts);
        Ok(())
    }
}
