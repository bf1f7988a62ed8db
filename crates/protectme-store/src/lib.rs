//! # protectme-store
//!
//! Durable local storage for reports, support resources and pending SOS
//! alerts.  This is the single source of truth while the device is offline.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model.  Every write is a single-row statement except the wholesale
//! resource replacement, which runs in one transaction.

pub mod alerts;
pub mod database;
pub mod migrations;
pub mod models;
pub mod reports;
pub mod resources;
pub mod seed;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
