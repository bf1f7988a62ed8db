//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! the schema exists and the default resources are seeded before any other
//! operation.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::{migrations, seed};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "protectme.db";

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

/// Platform-appropriate data directory for the application:
/// - Linux:   `~/.local/share/protectme`
/// - macOS:   `~/Library/Application Support/org.protectme.protectme`
/// - Windows: `{FOLDERID_RoamingAppData}\protectme\protectme\data`
pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("org", "protectme", "protectme").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().to_path_buf())
}

impl Database {
    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.  Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create the schema if absent and seed the default resources on first
    /// run.  Safe to call any number of times.
    pub fn initialize(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;

        let seeded = seed::seed_default_resources(self)?;
        if seeded > 0 {
            tracing::info!(count = seeded, "seeded default resources");
        }
        Ok(())
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
