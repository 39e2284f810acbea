use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const IMS_ISSUE_VIEW_URL: &str = "https://ims.tmaxsoft.com/tody/ims/issue/issueView.do";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Feature,
    Inquiry,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    New,
    InProgress,
    Review,
    Completed,
    OnHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Bug => "bug",
            IssueType::Feature => "feature",
            IssueType::Inquiry => "inquiry",
            IssueType::Task => "task",
        }
    }
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::New => "new",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Review => "review",
            IssueStatus::Completed => "completed",
            IssueStatus::OnHold => "on_hold",
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(IssueType::Bug),
            "feature" => Ok(IssueType::Feature),
            "inquiry" => Ok(IssueType::Inquiry),
            "task" => Ok(IssueType::Task),
            other => Err(format!("Unknown issue type: {other}")),
        }
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(IssueStatus::New),
            "in_progress" => Ok(IssueStatus::InProgress),
            "review" => Ok(IssueStatus::Review),
            "completed" => Ok(IssueStatus::Completed),
            "on_hold" => Ok(IssueStatus::OnHold),
            other => Err(format!("Unknown issue status: {other}")),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority: {other}")),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub assignee_id: Option<String>,
    pub reporter_id: String,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub ims_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set accepted by the issue store on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_issue_type")]
    pub issue_type: IssueType,
    #[serde(default = "default_issue_status")]
    pub status: IssueStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub reporter_id: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ims_number: Option<String>,
}

fn default_issue_type() -> IssueType {
    IssueType::Task
}

fn default_issue_status() -> IssueStatus {
    IssueStatus::New
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// Link to an issue in the external tracker.
pub fn ims_url(ims_number: &str) -> String {
    format!("{IMS_ISSUE_VIEW_URL}?issueId={ims_number}&menuCode=issue_list")
}
