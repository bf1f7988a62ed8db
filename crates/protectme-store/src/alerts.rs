use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use protectme_shared::AlertStatus;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{format_timestamp, parse_column, parse_timestamp, PendingAlert};

impl Database {
    /// Record one SOS trigger.  Returns the new alert id.
    pub fn create_pending_alert(&self, phone_number: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO pending_alerts (phone_number, status, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                phone_number,
                AlertStatus::Pending.as_str(),
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// All alerts regardless of status, newest first.
    pub fn list_pending_alerts(&self) -> Result<Vec<PendingAlert>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, phone_number, status, created_at
             FROM pending_alerts ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_alert)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn list_alerts_with_status(&self, status: AlertStatus) -> Result<Vec<PendingAlert>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, phone_number, status, created_at
             FROM pending_alerts WHERE status = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![status.as_str()], row_to_alert)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Returns `false` when the alert already had `status`.
    pub fn set_alert_status(&self, id: i64, status: AlertStatus) -> Result<bool> {
        let raw: String = self
            .conn()
            .query_row(
                "SELECT status FROM pending_alerts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound)?;
        let current: AlertStatus = parse_column(0, &raw)?;

        if current == status {
            return Ok(false);
        }
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current.to_string(),
                to: status.to_string(),
            });
        }

        self.conn().execute(
            "UPDATE pending_alerts SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(true)
    }
}

fn row_to_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingAlert> {
    let status_str: String = row.get(2)?;
    let created_str: String = row.get(3)?;

    Ok(PendingAlert {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        status: parse_column(2, &status_str)?,
        created_at: parse_timestamp(3, &created_str)?,
    })
}
