use serde::{Deserialize, Serialize};

/// Project lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// Project model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub description: String,
    pub status: ProjectStatus,
    pub created_ts: i64,
}

impl Project {
    pub fn new(id: String, description: String) -> Self {
        Self {
            id,
            description,
            status: ProjectStatus::Active,
            created_ts: chrono::Utc::now().timestamp(),
        }
    }
}
