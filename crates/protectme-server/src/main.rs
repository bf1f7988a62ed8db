//! # protectme-server
//!
//! Demo remote service for the ProtectMe client.
//!
//! This binary provides:
//! - **Health and metrics** endpoints that need no credentials
//! - **Report and alert sync** endpoints that keep records in memory and
//!   fail a configurable share of requests so client retries can be observed
//! - **Resource directory** served as a static list
//! - **Shared API key** check on every other route

mod api;
mod auth;
mod config;
mod error;
mod metrics;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,protectme_server=debug,tower_http=debug")),
        )
        .init();

    info!("Starting ProtectMe demo server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let http_addr = config.http_addr;
    let state = AppState::new(config);

    if let Err(e) = api::serve(state, http_addr).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    Ok(())
}
