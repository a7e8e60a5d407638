use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use crate::db::migrations::MigrationManager;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Database connection manager
///
/// The database location is always passed in explicitly (usually from
/// [`Config`](crate::config::Config)); nothing here consults the environment.
pub struct DbConnection;

impl DbConnection {
    /// Open the database at `path`, creating it and parent directories if needed
    pub fn open(path: &Path) -> Result<Connection> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL lets readers proceed while a transition is being written
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Failed to enable WAL journal")?;
        log::debug!("opened {} (journal_mode={})", path.display(), mode);

        Self::prepare(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Connection> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("ledger.db");

        let conn = DbConnection::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_open_uses_wal() {
        let temp_dir = TempDir::new().unwrap();
        let conn = DbConnection::open(&temp_dir.path().join("ledger.db")).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("ledger.db");
        {
            let conn = DbConnection::open(&db_path).unwrap();
            conn.execute(
                "INSERT INTO projects (id, description, created_ts) VALUES ('p', 'kept', 0)",
                [],
            )
            .unwrap();
        }
        let conn = DbConnection::open(&db_path).unwrap();
        let description: String = conn
            .query_row("SELECT description FROM projects WHERE id = 'p'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(description, "kept");
    }

    #[test]
    fn test_connect_in_memory() {
        let conn = DbConnection::connect_in_memory().unwrap();

        let version = MigrationManager::get_version(&conn).unwrap();
        assert_eq!(version, 2);

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
