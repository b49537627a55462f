//! Database module for mudra.
//!
//! Provides SQLite connection management, migrations, and the
//! [`DataService`] seam the capture pipeline submits gesture batches
//! through. The default database lives at `~/.mudra/mudra.db`.

pub mod gestures;
pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::features::FeatureVector;
use migrations::run_migrations;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to create database directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// The persistence contract the capture pipeline depends on.
///
/// `class_label_for` must be stable and deterministic for a given name:
/// submitting the same gesture name twice resolves to the same label.
/// `insert_batch` persists one capture session's vectors in a single call.
pub trait DataService: Send + Sync {
    fn class_label_for(&self, name: &str) -> Result<i64, DatabaseError>;
    fn insert_batch(&self, vectors: Vec<FeatureVector>) -> Result<(), DatabaseError>;
}

/// Returns the path to the mudra data directory (~/.mudra).
fn get_mudra_directory() -> Result<PathBuf, DatabaseError> {
    let home = dirs::home_dir().ok_or_else(|| {
        DatabaseError::DirectoryCreation(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        ))
    })?;

    Ok(home.join(".mudra"))
}

/// Returns the default path to the database file (~/.mudra/mudra.db).
pub fn default_database_path() -> Result<PathBuf, DatabaseError> {
    Ok(get_mudra_directory()?.join("mudra.db"))
}

/// SQLite-backed [`DataService`].
///
/// Holds only the database path; a fresh connection is opened per call so
/// the store can be shared across the UI thread and worker threads without
/// locking.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open a store at the given path, creating the parent directory and
    /// running migrations.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("Created database directory at {:?}", parent);
            }
        }

        let store = Self { db_path };
        store.initialise()?;
        Ok(store)
    }

    /// Open the store at the default location (~/.mudra/mudra.db).
    pub fn open_default() -> Result<Self, DatabaseError> {
        Self::open(default_database_path()?)
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Opens a new connection to the database with foreign keys enabled.
    pub fn connection(&self) -> Result<Connection, DatabaseError> {
        let conn = Connection::open(&self.db_path)?;
        // Worker threads write while the UI thread reads; wait out short
        // lock contention instead of failing with SQLITE_BUSY.
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(conn)
    }

    /// Runs migrations. Called once from [`SqliteStore::open`].
    fn initialise(&self) -> Result<(), DatabaseError> {
        tracing::info!("Initialising database at {:?}", self.db_path);
        let mut conn = self.connection()?;
        run_migrations(&mut conn)?;
        tracing::info!("Database initialised successfully");
        Ok(())
    }
}

impl DataService for SqliteStore {
    fn class_label_for(&self, name: &str) -> Result<i64, DatabaseError> {
        gestures::class_label_for(self, name)
    }

    fn insert_batch(&self, vectors: Vec<FeatureVector>) -> Result<(), DatabaseError> {
        gestures::insert_feature_vectors(self, &vectors)
    }
}

// Re-export the query surface for convenience
pub use gestures::{
    count_vectors_for, delete_gesture, list_gesture_classes, list_vectors_for, GestureClass,
    StoredFeatureVector,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_path_format() {
        let path = default_database_path().unwrap();
        assert!(path.to_string_lossy().contains(".mudra"));
        assert!(path.to_string_lossy().ends_with("mudra.db"));
    }

    #[test]
    fn test_open_creates_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested").join("test.db")).unwrap();

        let conn = store.connection().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}
