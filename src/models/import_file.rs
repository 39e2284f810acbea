use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFile {
    pub name: String,
    pub member_id: Option<String>,
    pub timestamp: Option<String>,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}
