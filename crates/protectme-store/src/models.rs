//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the UI
//! layer as part of the application snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use protectme_shared::{AlertStatus, ReportStatus, ResourceCategory};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// References to media stored on the device alongside a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    pub photo_uri: Option<String>,
    pub audio_uri: Option<String>,
    pub video_uri: Option<String>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.photo_uri.is_none() && self.audio_uri.is_none() && self.video_uri.is_none()
    }
}

/// An incident report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Local surrogate key.
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: ReportStatus,
    /// Fixed at creation; the sync path never writes it.
    pub is_anonymous: bool,
    /// `None` when no media is attached.
    pub attachments: Option<Attachments>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Derived from the stored media references.
    pub fn has_attachment(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }
}

/// Fields accepted by [`Database::upsert_report`](crate::Database::upsert_report).
///
/// `id == None` inserts a new row; otherwise the existing row is updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub is_anonymous: bool,
    pub attachments: Option<Attachments>,
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A support-service directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub category: ResourceCategory,
    pub phone: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_open_24h: bool,
}

// ---------------------------------------------------------------------------
// Pending alert
// ---------------------------------------------------------------------------

/// A locally recorded SOS trigger.  Never edited, only resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingAlert {
    pub id: i64,
    pub phone_number: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

// Fixed-width UTC so TEXT ordering matches chronological ordering.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
