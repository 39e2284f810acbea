use crate::models::issue::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String, // "backlog" | "in_progress" | "review" | "completed" | "on_hold"
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub customer: String,
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: String,
    #[serde(default = "default_project_status")]
    pub status: String,
    #[serde(default = "default_project_priority")]
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub customer: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

pub const PROJECT_STATUSES: &[&str] = &["backlog", "in_progress", "review", "completed", "on_hold"];

fn default_project_status() -> String {
    "backlog".to_string()
}

fn default_project_priority() -> Priority {
    Priority::Medium
}
