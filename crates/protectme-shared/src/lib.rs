//! # protectme-shared
//!
//! Types shared between the offline-first client and the demo sync server:
//! closed status enums, the resource taxonomy, wire DTOs and protocol
//! constants.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ParseEnumError;
pub use types::{AlertStatus, ReportStatus, ResourceCategory, SyncState};
