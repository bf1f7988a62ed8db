//! # protectme-client
//!
//! Offline-first client core: the application facade, the remote sync
//! client and the orchestrator that reconciles the two.

pub mod api;
pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod platform;
pub mod preferences;
pub mod state;
pub mod sync;
pub mod validation;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use app::{ProtectMe, SosOutcome};
pub use config::ClientConfig;
pub use error::ClientError;
pub use state::AppSnapshot;
pub use sync::{SyncOutcome, SyncSummary};

/// Install the global tracing subscriber.  `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("protectme_client=debug,protectme_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
