use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            log::info!("applying schema migration v{}", version);
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: projects, tasks and the transition audit log
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE projects (
            id TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','archived')),
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    // status is a stage name of the task's flow, so it is not constrained here
    tx.execute(
        "CREATE TABLE tasks (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            task_type TEXT NOT NULL,
            description TEXT NOT NULL,
            file_path TEXT NULL,
            status TEXT NOT NULL,
            class_required TEXT NULL,
            assigned_to TEXT NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;

    // Append-only: rows are never updated or deleted
    tx.execute(
        "CREATE TABLE transitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id TEXT NOT NULL REFERENCES tasks(id),
            from_status TEXT NOT NULL,
            to_status TEXT NOT NULL,
            agent TEXT NULL,
            valid INTEGER NOT NULL DEFAULT 1 CHECK(valid IN (0, 1)),
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Migration v2: indexes for task filters and audit log lookups
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute("CREATE INDEX idx_tasks_project_id ON tasks(project_id)", [])?;
    tx.execute("CREATE INDEX idx_tasks_status ON tasks(status)", [])?;
    tx.execute("CREATE INDEX idx_tasks_class_required ON tasks(class_required)", [])?;
    tx.execute("CREATE INDEX idx_tasks_assigned_to ON tasks(assigned_to)", [])?;
    tx.execute("CREATE INDEX idx_transitions_task_id ON transitions(task_id)", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(tables, vec!["projects", "schema_version", "tasks", "transitions"]);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        MigrationManager::initialize(&conn).unwrap();

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, CURRENT_VERSION);
    }

    #[test]
    fn test_valid_flag_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO projects (id, description, created_ts) VALUES ('p', 'd', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (id, project_id, task_type, description, status, created_ts, modified_ts)
             VALUES ('t', 'p', 'bugfix', 'd', 'open', 0, 0)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO transitions (task_id, from_status, to_status, valid, created_ts)
             VALUES ('t', 'open', 'assigned', 2, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
