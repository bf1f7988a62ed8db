//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `reports`, `resources` and
//! `pending_alerts`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Reports
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS reports (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    status       TEXT NOT NULL,               -- draft | pending | synced
    created_at   TEXT NOT NULL,               -- RFC-3339, UTC, millisecond precision
    updated_at   TEXT NOT NULL,
    is_anonymous INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    photo_uri    TEXT,
    audio_uri    TEXT
);

-- ----------------------------------------------------------------
-- Resources (support directory)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS resources (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    category    TEXT NOT NULL,
    phone       TEXT NOT NULL DEFAULT '',
    address     TEXT NOT NULL DEFAULT '',
    latitude    REAL,
    longitude   REAL,
    is_open_24h INTEGER NOT NULL DEFAULT 0
);

-- ----------------------------------------------------------------
-- Pending SOS alerts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pending_alerts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number TEXT NOT NULL,
    status       TEXT NOT NULL,               -- pending | resolved
    created_at   TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
