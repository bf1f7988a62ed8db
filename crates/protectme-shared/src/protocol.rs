//! JSON bodies exchanged with the remote sync service.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ResourceCategory;

/// Body of `POST /reports/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReportRequest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /alerts/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAlertRequest {
    pub id: i64,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

/// Acknowledgment returned by both sync endpoints.
///
/// Any 2xx JSON object counts as delivered.  The server-side id is kept
/// as raw JSON because servers answer with strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAck {
    #[serde(default)]
    pub id: serde_json::Value,
}

/// A resource as served by `GET /resources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: i64,
    pub name: String,
    pub category: ResourceCategory,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub is_open_24h: bool,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
}

/// JSON error body returned by the server on any failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
