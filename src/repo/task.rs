use rusqlite::{Connection, OptionalExtension, Row};
use rusqlite::types::ToSql;
use crate::models::{NewTask, Task, TaskFilter, INITIAL_STATUS};
use anyhow::{Context, Result};

const TASK_COLUMNS: &str = "id, project_id, task_type, description, file_path, status, \
                            class_required, assigned_to, created_ts, modified_ts";

/// Task repository for database operations
///
/// Only plain row access lives here. Status changes that must be checked
/// against a flow and written to the audit log go through
/// [`TaskStore`](crate::store::TaskStore).
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task in the initial status
    pub fn create(conn: &Connection, new: &NewTask) -> Result<Task> {
        let now = chrono::Utc::now().timestamp();
        let task = Task {
            id: new.id.clone(),
            project_id: new.project_id.clone(),
            task_type: new.task_type.clone(),
            description: new.description.clone(),
            file_path: new.file_path.clone(),
            status: INITIAL_STATUS.to_string(),
            class_required: new.class_required.clone(),
            assigned_to: None,
            created_ts: now,
            modified_ts: now,
        };

        conn.execute(
            &format!(
                "INSERT INTO tasks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                TASK_COLUMNS
            ),
            rusqlite::params![
                task.id,
                task.project_id,
                task.task_type,
                task.description,
                task.file_path,
                task.status,
                task.class_required,
                task.assigned_to,
                task.created_ts,
                task.modified_ts
            ],
        )
        .with_context(|| format!("Failed to create task: {}", new.id))?;

        Ok(task)
    }

    /// Get task by ID
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Task>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;
        let task = stmt.query_row([id], task_from_row).optional()?;
        Ok(task)
    }

    /// List tasks matching every set field of `filter`, in creation order
    pub fn list(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut clauses = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        let columns = [
            ("project_id", &filter.project_id),
            ("status", &filter.status),
            ("class_required", &filter.class_required),
            ("assigned_to", &filter.assigned_to),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                params.push(value);
                clauses.push(format!("{} = ?{}", column, params.len()));
            }
        }

        let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Move a task to `status`. `assigned_to` replaces the assignee when given.
    pub fn update_status(
        conn: &Connection,
        id: &str,
        status: &str,
        assigned_to: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE tasks SET status = ?1, assigned_to = COALESCE(?2, assigned_to), modified_ts = ?3
             WHERE id = ?4",
            rusqlite::params![status, assigned_to, now, id],
        )
        .with_context(|| format!("Failed to update status of task {}", id))?;
        Ok(())
    }
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        task_type: row.get(2)?,
        description: row.get(3)?,
        file_path: row.get(4)?,
        status: row.get(5)?,
        class_required: row.get(6)?,
        assigned_to: row.get(7)?,
        created_ts: row.get(8)?,
        modified_ts: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::repo::ProjectRepo;

    fn setup() -> Connection {
        let conn = DbConnection::connect_in_memory().unwrap();
        ProjectRepo::create(&conn, "p1", "project one").unwrap();
        ProjectRepo::create(&conn, "p2", "project two").unwrap();
        conn
    }

    #[test]
    fn test_create_and_get() {
        let conn = setup();
        let new = NewTask::new("BUG-1", "p1", "test bug")
            .class_required("coder")
            .file_path("bugs/1.md");
        let created = TaskRepo::create(&conn, &new).unwrap();

        assert_eq!(created.status, "open");
        assert_eq!(created.task_type, "bugfix");
        assert!(created.assigned_to.is_none());

        let fetched = TaskRepo::get(&conn, "BUG-1").unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(TaskRepo::get(&conn, "BUG-2").unwrap().is_none());
    }

    #[test]
    fn test_create_requires_existing_project() {
        let conn = setup();
        let result = TaskRepo::create(&conn, &NewTask::new("T-1", "ghost", "orphan"));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_filters() {
        let conn = setup();
        TaskRepo::create(&conn, &NewTask::new("T-1", "p1", "bug one").class_required("coder")).unwrap();
        TaskRepo::create(&conn, &NewTask::new("T-2", "p1", "bug two").class_required("recon")).unwrap();
        TaskRepo::create(&conn, &NewTask::new("T-3", "p2", "bug three").class_required("coder")).unwrap();
        TaskRepo::update_status(&conn, "T-1", "assigned", Some("fighter")).unwrap();

        assert_eq!(TaskRepo::list(&conn, &TaskFilter::new()).unwrap().len(), 3);
        assert_eq!(TaskRepo::list(&conn, &TaskFilter::new().project("p1")).unwrap().len(), 2);
        assert_eq!(TaskRepo::list(&conn, &TaskFilter::new().status("open")).unwrap().len(), 2);
        assert_eq!(TaskRepo::list(&conn, &TaskFilter::new().class_required("coder")).unwrap().len(), 2);
        assert_eq!(
            TaskRepo::list(&conn, &TaskFilter::new().project("p1").status("assigned")).unwrap().len(),
            1
        );

        let mine = TaskRepo::list(&conn, &TaskFilter::new().assigned_to("fighter")).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "T-1");
    }

    #[test]
    fn test_list_in_creation_order() {
        let conn = setup();
        for id in ["Z-1", "A-1", "M-1"] {
            TaskRepo::create(&conn, &NewTask::new(id, "p1", "task")).unwrap();
        }
        let ids: Vec<String> = TaskRepo::list(&conn, &TaskFilter::new())
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["Z-1", "A-1", "M-1"]);
    }

    #[test]
    fn test_update_status_keeps_assignee_when_none() {
        let conn = setup();
        TaskRepo::create(&conn, &NewTask::new("T-1", "p1", "task")).unwrap();
        TaskRepo::update_status(&conn, "T-1", "assigned", Some("fighter")).unwrap();
        TaskRepo::update_status(&conn, "T-1", "in_progress", None).unwrap();

        let task = TaskRepo::get(&conn, "T-1").unwrap().unwrap();
        assert_eq!(task.status, "in_progress");
        assert_eq!(task.assigned_to.as_deref(), Some("fighter"));
    }
}
