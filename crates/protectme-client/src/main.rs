//! Command-line entry point: open the local store, print what it holds and
//! run one sync pass against the configured service.

use anyhow::Context;

use protectme_client::platform::Platform;
use protectme_client::{ClientConfig, ProtectMe, SyncOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    protectme_client::init_tracing();

    let config = ClientConfig::from_env();
    tracing::info!(?config, "Starting ProtectMe client");

    let app = ProtectMe::start(config, Platform::headless())
        .await
        .context("failed to open local store")?;

    let snapshot = app.snapshot();
    println!(
        "{} reports, {} resources, {} alerts",
        snapshot.reports.len(),
        snapshot.resources.len(),
        snapshot.pending_alerts.len()
    );

    match app.sync_now().await {
        SyncOutcome::Completed(summary) => println!(
            "sync complete: {} reports synced ({} failed), {} alerts synced ({} failed), {} resources refreshed in {:?}",
            summary.reports_synced,
            summary.reports_failed,
            summary.alerts_synced,
            summary.alerts_failed,
            summary.resources_refreshed,
            summary.duration
        ),
        SyncOutcome::Failed(reason) => println!("sync failed: {reason}"),
        SyncOutcome::AlreadyRunning => println!("sync already running"),
    }

    Ok(())
}
