use thiserror::Error;

/// Domain failures of the store, returned inside `anyhow::Error`.
///
/// Use `err.downcast_ref::<StoreError>()` to tell them apart from database
/// or flow errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Task '{task_id}' is '{status}', not 'open'")]
    NotClaimable { task_id: String, status: String },
}
