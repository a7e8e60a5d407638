use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{Project, ProjectStatus};
use crate::error::StoreError;
use anyhow::{Context, Result};

const PROJECT_COLUMNS: &str = "id, description, status, created_ts";

/// Project repository for database operations
///
/// Projects group tasks. They are never deleted; a finished project is
/// archived instead so its tasks and their audit history stay reachable.
///
/// # Example
///
/// ```no_run
/// use flowledger::db::DbConnection;
/// use flowledger::repo::ProjectRepo;
///
/// let conn = DbConnection::connect_in_memory().unwrap();
/// let project = ProjectRepo::create(&conn, "proj", "test project").unwrap();
/// ProjectRepo::archive(&conn, &project.id).unwrap();
/// ```
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a new project
    pub fn create(conn: &Connection, id: &str, description: &str) -> Result<Project> {
        let project = Project::new(id.to_string(), description.to_string());

        conn.execute(
            "INSERT INTO projects (id, description, status, created_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                project.id,
                project.description,
                project.status.as_str(),
                project.created_ts
            ],
        )
        .with_context(|| format!("Failed to create project: {}", id))?;

        Ok(project)
    }

    /// Get project by ID
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Project>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects WHERE id = ?1",
            PROJECT_COLUMNS
        ))?;

        let project = stmt.query_row([id], project_from_row).optional()?;
        Ok(project)
    }

    /// List projects in creation order, optionally only those with `status`
    pub fn list(conn: &Connection, status: Option<ProjectStatus>) -> Result<Vec<Project>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects WHERE (?1 IS NULL OR status = ?1) ORDER BY rowid",
            PROJECT_COLUMNS
        ))?;

        let rows = stmt.query_map([status.map(|s| s.as_str())], project_from_row)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Archive a project
    pub fn archive(conn: &Connection, id: &str) -> Result<()> {
        let rows_affected = conn.execute(
            "UPDATE projects SET status = ?1 WHERE id = ?2",
            rusqlite::params![ProjectStatus::Archived.as_str(), id],
        )?;

        if rows_affected == 0 {
            return Err(StoreError::ProjectNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    let status: String = row.get(2)?;
    Ok(Project {
        id: row.get(0)?,
        description: row.get(1)?,
        status: ProjectStatus::from_str(&status).unwrap_or(ProjectStatus::Active),
        created_ts: row.get(3)?,
    })
}
