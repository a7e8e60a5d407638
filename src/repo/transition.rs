use rusqlite::{Connection, Row};
use crate::models::TransitionRecord;
use anyhow::{Context, Result};

/// Append-only access to the transition audit log
pub struct TransitionRepo;

impl TransitionRepo {
    /// Append a record of a status change
    pub fn record(
        conn: &Connection,
        task_id: &str,
        from_status: &str,
        to_status: &str,
        agent: Option<&str>,
        valid: bool,
    ) -> Result<TransitionRecord> {
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO transitions (task_id, from_status, to_status, agent, valid, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![task_id, from_status, to_status, agent, valid as i64, now],
        )
        .with_context(|| {
            format!(
                "Failed to record transition {} -> {} for task {}",
                from_status, to_status, task_id
            )
        })?;

        Ok(TransitionRecord {
            id: conn.last_insert_rowid(),
            task_id: task_id.to_string(),
            from_status: from_status.to_string(),
            to_status: to_status.to_string(),
            agent: agent.map(str::to_string),
            valid,
            created_ts: now,
        })
    }

    /// All records for a task, oldest first
    pub fn list_for_task(conn: &Connection, task_id: &str) -> Result<Vec<TransitionRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, task_id, from_status, to_status, agent, valid, created_ts
             FROM transitions
             WHERE task_id = ?1
             ORDER BY created_ts, id",
        )?;

        let rows = stmt.query_map([task_id], record_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<TransitionRecord> {
    Ok(TransitionRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        from_status: row.get(2)?,
        to_status: row.get(3)?,
        agent: row.get(4)?,
        valid: row.get::<_, i64>(5)? != 0,
        created_ts: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::NewTask;
    use crate::repo::{ProjectRepo, TaskRepo};

    fn setup() -> Connection {
        let conn = DbConnection::connect_in_memory().unwrap();
        ProjectRepo::create(&conn, "proj", "test project").unwrap();
        TaskRepo::create(&conn, &NewTask::new("BUG-1", "proj", "test bug")).unwrap();
        conn
    }

    #[test]
    fn test_record_and_list() {
        let conn = setup();
        let first = TransitionRepo::record(&conn, "BUG-1", "open", "assigned", Some("fighter"), true).unwrap();
        TransitionRepo::record(&conn, "BUG-1", "assigned", "closed", None, false).unwrap();

        let log = TransitionRepo::list_for_task(&conn, "BUG-1").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], first);
        assert_eq!(log[1].from_status, "assigned");
        assert_eq!(log[1].to_status, "closed");
        assert!(log[1].agent.is_none());
        assert!(!log[1].valid);
    }

    #[test]
    fn test_valid_stored_as_integer() {
        let conn = setup();
        TransitionRepo::record(&conn, "BUG-1", "open", "closed", None, false).unwrap();
        let stored: i64 = conn
            .query_row("SELECT valid FROM transitions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[test]
    fn test_record_requires_existing_task() {
        let conn = setup();
        let result = TransitionRepo::record(&conn, "GHOST", "open", "assigned", None, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_for_unknown_task_is_empty() {
        let conn = setup();
        assert!(TransitionRepo::list_for_task(&conn, "GHOST").unwrap().is_empty());
    }
}
