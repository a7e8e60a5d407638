//! Task store: projects, tasks and the transition audit log, routed by flows.
//!
//! The store owns one SQLite connection and a [`FlowLoader`]. Every status
//! change consults the task's flow and is written together with its audit
//! record in a single transaction.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::Config;
use crate::db::DbConnection;
pub use crate::error::StoreError;
use crate::flow::{DirSource, Flow, FlowLoader, FlowSource, Transition};
use crate::models::{NewTask, Project, ProjectStatus, Task, TaskFilter, TransitionRecord, INITIAL_STATUS};
use crate::repo::{ProjectRepo, TaskRepo, TransitionRepo};

/// Status a task moves to when claimed
pub const CLAIMED_STATUS: &str = "assigned";

/// Result of a manual transition.
///
/// The change is always persisted; `record.valid` says whether it followed
/// the flow, and `allowed` lists what the flow would have accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub task: Task,
    pub record: TransitionRecord,
    pub allowed: BTreeSet<String>,
}

impl TransitionOutcome {
    pub fn is_valid(&self) -> bool {
        self.record.valid
    }
}

/// Durable task ledger bound to a source of flow definitions
///
/// # Example
///
/// ```no_run
/// use flowledger::config::Config;
/// use flowledger::models::NewTask;
/// use flowledger::store::TaskStore;
///
/// let store = TaskStore::open(&Config::new("ledger.db", "flows")).unwrap();
/// store.create_project("proj", "test project").unwrap();
/// store.create_task(&NewTask::new("BUG-1", "proj", "crash on save").class_required("coder")).unwrap();
/// store.claim_task("BUG-1", "fighter").unwrap();
/// store.transition_task("BUG-1", "in_progress", Some("fighter")).unwrap();
/// let next = store.complete("BUG-1", "fighter", true).unwrap();
/// ```
pub struct TaskStore<S = DirSource> {
    conn: Connection,
    loader: FlowLoader<S>,
}

impl TaskStore<DirSource> {
    /// Open the database and flow directory named by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let conn = DbConnection::open(&config.data_location)?;
        Ok(Self::with_connection(conn, DirSource::new(&config.flows_location)))
    }
}

impl<S: FlowSource> TaskStore<S> {
    /// Wrap an already initialized connection (see [`DbConnection`])
    pub fn with_connection(conn: Connection, source: S) -> Self {
        Self {
            conn,
            loader: FlowLoader::new(source),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn loader(&self) -> &FlowLoader<S> {
        &self.loader
    }

    // --- Projects ---

    pub fn create_project(&self, id: &str, description: &str) -> Result<Project> {
        ProjectRepo::create(&self.conn, id, description)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        ProjectRepo::get(&self.conn, id)
    }

    pub fn list_projects(&self, status: Option<ProjectStatus>) -> Result<Vec<Project>> {
        ProjectRepo::list(&self.conn, status)
    }

    pub fn archive_project(&self, id: &str) -> Result<()> {
        ProjectRepo::archive(&self.conn, id)
    }

    // --- Tasks ---

    /// Create a task in its project, bound to the flow named by `task_type`.
    ///
    /// Fails if the project does not exist or the flow cannot be loaded.
    pub fn create_task(&self, new: &NewTask) -> Result<Task> {
        if ProjectRepo::get(&self.conn, &new.project_id)?.is_none() {
            return Err(StoreError::ProjectNotFound(new.project_id.clone()).into());
        }
        self.loader.load(&new.task_type)?;
        TaskRepo::create(&self.conn, new)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        TaskRepo::get(&self.conn, id)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        TaskRepo::list(&self.conn, filter)
    }

    /// The flow a task follows
    pub fn flow_for(&self, task_id: &str) -> Result<Flow> {
        let task = require_task(&self.conn, task_id)?;
        Ok(self.loader.load(&task.task_type)?)
    }

    // --- Transitions ---

    /// Move a task to `to_status`, whether or not its flow allows it.
    ///
    /// Irregular moves are persisted with `valid = false` and logged as a
    /// warning; they are never refused. When `agent` is given it becomes the
    /// task's assignee.
    pub fn transition_task(
        &self,
        task_id: &str,
        to_status: &str,
        agent: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let tx = self.begin()?;
        let task = require_task(&tx, task_id)?;
        let outcome = self.move_task(&tx, task, to_status, agent)?;
        tx.commit().context("Failed to commit transition")?;
        Ok(outcome)
    }

    /// Claim an open task for `agent`, moving it to `assigned`.
    pub fn claim_task(&self, task_id: &str, agent: &str) -> Result<TransitionOutcome> {
        let tx = self.begin()?;
        let task = require_task(&tx, task_id)?;
        if task.status != INITIAL_STATUS {
            return Err(StoreError::NotClaimable {
                task_id: task.id,
                status: task.status,
            }
            .into());
        }
        let outcome = self.move_task(&tx, task, CLAIMED_STATUS, Some(agent))?;
        tx.commit().context("Failed to commit claim")?;
        Ok(outcome)
    }

    /// The assignee reports the current stage done (`passed`) or rejected.
    ///
    /// The flow decides the destination; the move is recorded as valid.
    /// Returns `None`, and changes nothing, when the flow defines no move.
    pub fn complete(&self, task_id: &str, agent: &str, passed: bool) -> Result<Option<Transition>> {
        let tx = self.begin()?;
        let task = require_task(&tx, task_id)?;
        let flow = self.loader.load(&task.task_type)?;

        let class_required = task.class_required.as_deref().unwrap_or("");
        let Some(transition) = flow.transition(&task.status, class_required, passed) else {
            log::debug!(
                "no {} transition from '{}' for task {}",
                if passed { "pass" } else { "fail" },
                task.status,
                task_id
            );
            return Ok(None);
        };

        write_move(&tx, &task, &transition.to_status, None, Some(agent), true)?;
        tx.commit().context("Failed to commit completion")?;
        Ok(Some(transition))
    }

    /// Audit log of a task, oldest first
    pub fn transitions(&self, task_id: &str) -> Result<Vec<TransitionRecord>> {
        TransitionRepo::list_for_task(&self.conn, task_id)
    }

    /// Take the write lock up front so the status a move is checked against
    /// is the status it replaces.
    fn begin(&self) -> Result<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("Failed to begin transition")
    }

    fn move_task(
        &self,
        conn: &Connection,
        task: Task,
        to_status: &str,
        agent: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let flow = self.loader.load(&task.task_type)?;

        let allowed: BTreeSet<String> = flow
            .valid_transitions(&task.status)
            .into_iter()
            .map(str::to_string)
            .collect();
        let valid = allowed.contains(to_status);
        if !valid {
            log::warn!(
                "transition {} -> {} of task {} is not valid for flow '{}' (valid: {:?}); recording with valid=0",
                task.status,
                to_status,
                task.id,
                task.task_type,
                allowed
            );
        }

        let record = write_move(conn, &task, to_status, agent, agent, valid)?;
        let task = require_task(conn, &task.id)?;
        Ok(TransitionOutcome {
            task,
            record,
            allowed,
        })
    }
}

fn require_task(conn: &Connection, task_id: &str) -> Result<Task> {
    TaskRepo::get(conn, task_id)?
        .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()).into())
}

/// Status update plus audit record. Callers run it inside their transaction.
fn write_move(
    conn: &Connection,
    task: &Task,
    to_status: &str,
    assign: Option<&str>,
    agent: Option<&str>,
    valid: bool,
) -> Result<TransitionRecord> {
    TaskRepo::update_status(conn, &task.id, to_status, assign)?;
    let record = TransitionRepo::record(conn, &task.id, &task.status, to_status, agent, valid)?;

    log::debug!(
        "task {}: {} -> {} (agent={:?}, valid={})",
        task.id,
        task.status,
        to_status,
        agent,
        valid
    );
    Ok(record)
}
