//! v002 -- Video attachments and sync-selection indexes.

use rusqlite::Connection;

const UP_SQL: &str = r#"
ALTER TABLE reports ADD COLUMN video_uri TEXT;

CREATE INDEX IF NOT EXISTS idx_reports_status_created
    ON reports(status, created_at DESC);

CREATE INDEX IF NOT EXISTS idx_pending_alerts_status
    ON pending_alerts(status, created_at DESC);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
