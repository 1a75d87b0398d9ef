use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::SQLITE_BUSY_TIMEOUT_MS;
use crate::{StoreError, StoreResult};
use rusqlite::Connection;

/// One connection shared by the settings manager and the options facade.
/// The mutex is the single-writer path for both tables.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Opens the store database with the common pragmas
pub fn open_connection(path: &std::path::Path) -> StoreResult<Connection> {
    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)
        .map_err(|e| StoreError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Database connection opened");

    configure(&conn)?;
    Ok(conn)
}

/// In-memory database with the same pragmas (tests, dry runs)
pub fn open_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| StoreError::Storage(format!("Failed to open in-memory database: {}", e)))?;
    configure(&conn)?;
    Ok(conn)
}

pub fn into_shared(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Lock the shared connection, surfacing a poisoned mutex as a storage error.
pub fn lock(conn: &SharedConnection) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Storage(format!("Connection lock poisoned: {}", e)))
}

/// Pragmas:
/// - journal_mode = WAL
/// - busy_timeout = SQLITE_BUSY_TIMEOUT_MS (constants.rs)
/// - synchronous = NORMAL
/// - foreign_keys = ON
fn configure(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = {};
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
        SQLITE_BUSY_TIMEOUT_MS,
    ))
    .map_err(|e| StoreError::Storage(format!("Failed to configure pragmas: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_db_path() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.sqlite");
        (dir, path)
    }

    #[test]
    fn test_open_connection_creates_parent_dirs() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path);
        assert!(conn.is_ok(), "open_connection should not error");
        assert!(path.exists());
    }

    #[test]
    fn test_busy_timeout_set_correctly() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path).unwrap();
        let timeout: u32 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, SQLITE_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_wal_enabled_on_disk() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_lock_shared_connection() {
        let shared = into_shared(open_in_memory().unwrap());
        let guard = lock(&shared).unwrap();
        let one: i64 = guard.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
