use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use protectme_shared::ReportStatus;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{format_timestamp, parse_column, parse_timestamp, Attachments, Report, ReportInput};

const REPORT_COLUMNS: &str = "id, title, description, status, created_at, updated_at, \
                              is_anonymous, photo_uri, audio_uri, video_uri";

impl Database {
    /// All reports, newest-created first.
    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], row_to_report)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Reports in one lifecycle state, newest-created first.
    pub fn list_reports_with_status(&self, status: ReportStatus) -> Result<Vec<Report>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE status = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![status.as_str()], row_to_report)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn get_report(&self, id: i64) -> Result<Option<Report>> {
        self.conn()
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                params![id],
                row_to_report,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Insert when `input.id` is `None`, otherwise update the row in place.
    /// Returns the id of the written row.
    ///
    /// An update may not move the report backwards in its lifecycle, and a
    /// synced report cannot be edited at all.
    pub fn upsert_report(&self, input: &ReportInput, status: ReportStatus) -> Result<i64> {
        let now = format_timestamp(&Utc::now());
        let attachments = input.attachments.as_ref().filter(|a| !a.is_empty());
        let (photo, audio, video) = split_attachments(attachments);

        let Some(id) = input.id else {
            self.conn().execute(
                "INSERT INTO reports (title, description, status, created_at, updated_at,
                                      is_anonymous, photo_uri, audio_uri, video_uri)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.title,
                    input.description,
                    status.as_str(),
                    now,
                    input.is_anonymous,
                    photo,
                    audio,
                    video,
                ],
            )?;
            let id = self.conn().last_insert_rowid();
            tracing::debug!(id, status = %status, "inserted report");
            return Ok(id);
        };

        let current = self.report_status(id)?.ok_or(StoreError::NotFound)?;
        if current == ReportStatus::Synced || !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current.to_string(),
                to: status.to_string(),
            });
        }

        self.conn().execute(
            "UPDATE reports
             SET title = ?1, description = ?2, status = ?3, updated_at = ?4,
                 is_anonymous = ?5, photo_uri = ?6, audio_uri = ?7, video_uri = ?8
             WHERE id = ?9",
            params![
                input.title,
                input.description,
                status.as_str(),
                now,
                input.is_anonymous,
                photo,
                audio,
                video,
                id,
            ],
        )?;
        tracing::debug!(id, from = %current, to = %status, "updated report");
        Ok(id)
    }

    /// Hard delete.  Returns whether a row was removed.
    pub fn delete_report(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM reports WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Move a report forward to `status`, touching only `status` and
    /// `updated_at`.  Re-applying the current status leaves the row as it is
    /// and returns `false`.
    pub fn set_report_status(&self, id: i64, status: ReportStatus) -> Result<bool> {
        let current = self.report_status(id)?.ok_or(StoreError::NotFound)?;
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
            "UPDATE reports SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_timestamp(&Utc::now()), id],
        )?;
        Ok(true)
    }

    /// Mark a report synced after the server acknowledged `sent`.
    ///
    /// The row only moves to `Synced` while it is still pending and still
    /// holds the content that was sent.  Returns `false` when it was edited
    /// in the meantime; it then stays pending for the next pass.
    pub fn mark_report_synced(&self, sent: &Report) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE reports SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = ?4
               AND title = ?5 AND description = ?6 AND is_anonymous = ?7",
            params![
                ReportStatus::Synced.as_str(),
                format_timestamp(&Utc::now()),
                sent.id,
                ReportStatus::Pending.as_str(),
                sent.title,
                sent.description,
                sent.is_anonymous,
            ],
        )?;
        if affected == 0 && self.report_status(sent.id)?.is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(affected > 0)
    }

    fn report_status(&self, id: i64) -> Result<Option<ReportStatus>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT status FROM reports WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| parse_column::<ReportStatus>(0, &s))
            .transpose()
            .map_err(StoreError::Sqlite)
    }
}

fn split_attachments(
    attachments: Option<&Attachments>,
) -> (Option<&str>, Option<&str>, Option<&str>) {
    match attachments {
        Some(a) => (
            a.photo_uri.as_deref(),
            a.audio_uri.as_deref(),
            a.video_uri.as_deref(),
        ),
        None => (None, None, None),
    }
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let status_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    let attachments = Attachments {
        photo_uri: row.get(7)?,
        audio_uri: row.get(8)?,
        video_uri: row.get(9)?,
    };

    Ok(Report {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_column(3, &status_str)?,
        is_anonymous: row.get(6)?,
        attachments: (!attachments.is_empty()).then_some(attachments),
        created_at: parse_timestamp(4, &created_str)?,
        updated_at: parse_timestamp(5, &updated_str)?,
    })
}
