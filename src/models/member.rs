use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub name_ja: Option<String>,
    pub email: String,
    pub avatar: String,
    pub role: String, // "admin" | "member"
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    #[serde(default)]
    pub name_ja: Option<String>,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
}

fn default_role() -> String {
    "member".to_string()
}

impl Member {
    /// Owner token used in import file names, e.g. `park.ms` for `park.ms@company.co.jp`.
    pub fn file_owner_id(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}
