use crate::commands::db::ActivityFilter;
use crate::commands::issues::non_empty;
use crate::commands::{lock_db, refresh_cache, ApiError};
use crate::models::activity::{Activity, ActivityKind, NewActivity};
use crate::models::issue::IssueStatus;
use crate::server::SharedState;
use crate::store::ActivityStore;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub project_id: Option<String>,
    pub member_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[serde(rename = "type")]
    pub kind: Option<ActivityKind>,
    pub description: Option<String>,
    pub member_id: Option<String>,
    pub project_id: Option<String>,
    pub issue_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_issues: usize,
    pub issues_by_status: BTreeMap<String, usize>,
    pub recent_activities: Vec<Activity>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

pub async fn list_activities(
    State(state): State<SharedState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let filter = ActivityFilter {
        project_id: non_empty(query.project_id),
        member_id: non_empty(query.member_id),
        limit: query.limit,
    };

    let db = lock_db(&state)?;
    Ok(Json(db.list_activities(&filter)?))
}

pub async fn create_activity(
    State(state): State<SharedState>,
    Json(request): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    let (Some(kind), Some(description), Some(member_id)) = (
        request.kind,
        non_empty(request.description),
        non_empty(request.member_id),
    ) else {
        return Err(ApiError::bad_request("type, description, memberId are required"));
    };

    let fields = NewActivity {
        kind,
        description,
        member_id,
        project_id: non_empty(request.project_id),
        issue_id: non_empty(request.issue_id),
    };

    let db = lock_db(&state)?;
    let activity = db.create_activity(&fields)?;
    refresh_cache(&state, &db);
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Summary served from the last cache refresh, without touching the database.
pub async fn dashboard(State(state): State<SharedState>) -> Result<Json<DashboardResponse>, ApiError> {
    let cache = state
        .cache
        .lock()
        .map_err(|_| ApiError::internal("Cache lock error"))?;

    let mut issues_by_status: BTreeMap<String, usize> = [
        IssueStatus::New,
        IssueStatus::InProgress,
        IssueStatus::Review,
        IssueStatus::Completed,
        IssueStatus::OnHold,
    ]
    .iter()
    .map(|s| (s.as_str().to_string(), 0))
    .collect();
    for issue in cache.issues() {
        *issues_by_status.entry(issue.status.to_string()).or_default() += 1;
    }

    Ok(Json(DashboardResponse {
        total_issues: cache.issues().len(),
        issues_by_status,
        recent_activities: cache.activities().to_vec(),
        refreshed_at: cache.refreshed_at(),
    }))
}
