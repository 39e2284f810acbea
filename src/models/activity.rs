use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ProjectCreated,
    IssueCreated,
    StatusChanged,
    CommentAdded,
    MemberAssigned,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::ProjectCreated => "project_created",
            ActivityKind::IssueCreated => "issue_created",
            ActivityKind::StatusChanged => "status_changed",
            ActivityKind::CommentAdded => "comment_added",
            ActivityKind::MemberAssigned => "member_assigned",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project_created" => Ok(ActivityKind::ProjectCreated),
            "issue_created" => Ok(ActivityKind::IssueCreated),
            "status_changed" => Ok(ActivityKind::StatusChanged),
            "comment_added" => Ok(ActivityKind::CommentAdded),
            "member_assigned" => Ok(ActivityKind::MemberAssigned),
            other => Err(format!("Unknown activity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub member_id: String,
    pub project_id: Option<String>,
    pub issue_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub member_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub issue_id: Option<String>,
}

impl NewActivity {
    pub fn issue_created(title: &str, member_id: &str, project_id: &str, issue_id: &str) -> Self {
        Self {
            kind: ActivityKind::IssueCreated,
            description: format!("New issue \"{title}\" was created."),
            member_id: member_id.to_string(),
            project_id: Some(project_id.to_string()),
            issue_id: Some(issue_id.to_string()),
        }
    }

    pub fn status_changed(title: &str, member_id: &str, project_id: &str, issue_id: &str) -> Self {
        Self {
            kind: ActivityKind::StatusChanged,
            description: format!("Status of issue \"{title}\" was changed."),
            member_id: member_id.to_string(),
            project_id: Some(project_id.to_string()),
            issue_id: Some(issue_id.to_string()),
        }
    }

    pub fn project_created(name: &str, member_id: &str, project_id: &str) -> Self {
        Self {
            kind: ActivityKind::ProjectCreated,
            description: format!("New project \"{name}\" was created."),
            member_id: member_id.to_string(),
            project_id: Some(project_id.to_string()),
            issue_id: None,
        }
    }
}
