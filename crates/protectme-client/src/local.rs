//! Async access to the local database.
//!
//! SQLite calls block, so every store operation runs on tokio's blocking
//! pool while holding the connection mutex for the duration of the call.

use std::path::Path;
use std::sync::{Arc, Mutex};

use protectme_store::database::DATABASE_FILE;
use protectme_store::{Database, StoreError};

use crate::error::ClientError;

#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open (creating if needed) `protectme.db` inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, ClientError> {
        let dir = data_dir.to_path_buf();
        let db = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(DATABASE_FILE);
            tracing::info!(path = %path.display(), "opening database");
            Database::open_at(&path)
        })
        .await
        .map_err(|e| ClientError::Task(e.to_string()))??;
        Ok(Self::new(db))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Run `f` against the database on the blocking pool.
    pub async fn call<T, F>(&self, f: F) -> Result<T, ClientError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| ClientError::LockPoisoned)?;
            f(&guard).map_err(ClientError::from)
        })
        .await
        .map_err(|e| ClientError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_runs_against_the_database() {
        let store = LocalStore::open_in_memory().unwrap();
        let id = store
            .call(|db| db.create_pending_alert("112"))
            .await
            .unwrap();
        let alerts = store.call(|db| db.list_pending_alerts()).await.unwrap();
        assert_eq!(alerts[0].id, id);
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).await.unwrap();
        store.call(|db| db.list_reports()).await.unwrap();
        assert!(dir.path().join(DATABASE_FILE).exists());
    }

    #[tokio::test]
    async fn store_errors_are_propagated() {
        let store = LocalStore::open_in_memory().unwrap();
        let err = store
            .call(|db| db.set_alert_status(42, protectme_shared::AlertStatus::Resolved))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Store(StoreError::NotFound)));
    }
}
