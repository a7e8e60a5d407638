use serde::{Deserialize, Serialize};

/// One row of the transition audit log
///
/// Every status change is recorded, including irregular ones; `valid` tells
/// whether the target was a valid transition in the task's flow at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub task_id: String,
    pub from_status: String,
    pub to_status: String,
    pub agent: Option<String>,
    pub valid: bool,
    pub created_ts: i64,
}
