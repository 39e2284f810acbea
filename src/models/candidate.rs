use crate::models::issue::{IssueStatus, IssueType, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A spreadsheet row that has been parsed but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateIssue {
    /// External tracker id; the dedup key during import.
    pub ims_number: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub customer: String,
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_date: Option<DateTime<Utc>>,
    /// Status text exactly as it appeared in the sheet.
    pub ims_status: String,
    /// Issue page in the external tracker.
    #[serde(default)]
    pub tracker_url: String,
}
