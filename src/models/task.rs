use serde::{Deserialize, Serialize};

/// Flow used when a task is created without an explicit type
pub const DEFAULT_TASK_TYPE: &str = "bugfix";

/// Status every new task starts in
pub const INITIAL_STATUS: &str = "open";

/// Task model
///
/// A task is a pointer to a unit of work plus its position in a flow.
/// `task_type` names the flow the task follows for its whole lifecycle and
/// `status` is a stage name of that flow (or an irregular value forced in
/// through a manual transition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub task_type: String,
    pub description: String,
    pub file_path: Option<String>,
    pub status: String,
    pub class_required: Option<String>,
    pub assigned_to: Option<String>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

/// Fields supplied when creating a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: String,
    pub project_id: String,
    pub task_type: String,
    pub description: String,
    pub file_path: Option<String>,
    pub class_required: Option<String>,
}

impl NewTask {
    pub fn new(id: &str, project_id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            description: description.to_string(),
            file_path: None,
            class_required: None,
        }
    }

    pub fn task_type(mut self, task_type: &str) -> Self {
        self.task_type = task_type.to_string();
        self
    }

    pub fn file_path(mut self, file_path: &str) -> Self {
        self.file_path = Some(file_path.to_string());
        self
    }

    pub fn class_required(mut self, class_required: &str) -> Self {
        self.class_required = Some(class_required.to_string());
        self
    }
}

/// Filter for listing tasks; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub class_required: Option<String>,
    pub assigned_to: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn class_required(mut self, class_required: &str) -> Self {
        self.class_required = Some(class_required.to_string());
        self
    }

    pub fn assigned_to(mut self, agent: &str) -> Self {
        self.assigned_to = Some(agent.to_string());
        self
    }
}
