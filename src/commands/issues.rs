use crate::commands::db::IssueFilter;
use crate::commands::{lock_db, refresh_cache, ApiError};
use crate::models::issue::{Issue, IssueStatus, IssueType, NewIssue, Priority};
use crate::server::{AppState, SharedState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueQuery {
    pub project_id: Option<String>,
    pub assignee_id: Option<String>,
    pub status: Option<String>,
}

/// Body of `POST /api/issues`. Required fields are optional here so a missing
/// one becomes a 400 with a message instead of a body rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
    pub reporter_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub ims_number: Option<String>,
    pub current_member_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub current_member_id: Option<String>,
}

pub async fn list_issues(
    State(state): State<SharedState>,
    Query(query): Query<IssueQuery>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    Ok(Json(list_issues_internal(&state, query)?))
}

pub fn list_issues_internal(state: &AppState, query: IssueQuery) -> Result<Vec<Issue>, ApiError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<IssueStatus>().map_err(ApiError::bad_request)?),
        None => None,
    };
    let filter = IssueFilter {
        project_id: non_empty(query.project_id),
        assignee_id: non_empty(query.assignee_id),
        status,
    };

    let db = lock_db(state)?;
    Ok(db.list_issues(&filter)?)
}

pub async fn get_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    let db = lock_db(&state)?;
    db.get_issue(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Issue not found"))
}

pub async fn create_issue(
    State(state): State<SharedState>,
    Json(request): Json<CreateIssueRequest>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let issue = create_issue_internal(&state, request)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

pub fn create_issue_internal(state: &AppState, request: CreateIssueRequest) -> Result<Issue, ApiError> {
    let (Some(project_id), Some(title), Some(reporter_id)) = (
        non_empty(request.project_id),
        non_empty(request.title),
        non_empty(request.reporter_id),
    ) else {
        return Err(ApiError::bad_request("projectId, title, reporterId are required"));
    };

    let fields = NewIssue {
        project_id,
        title,
        description: request.description.unwrap_or_default(),
        issue_type: request.issue_type.unwrap_or(IssueType::Task),
        status: request.status.unwrap_or(IssueStatus::New),
        priority: request.priority.unwrap_or(Priority::Medium),
        assignee_id: non_empty(request.assignee_id),
        reporter_id,
        due_date: request.due_date,
        tags: request.tags.unwrap_or_default(),
        ims_number: non_empty(request.ims_number),
    };
    let current_member = non_empty(request.current_member_id);

    let db = lock_db(state)?;
    let issue = db.create_issue_with_activity(&fields, current_member.as_deref())?;
    refresh_cache(state, &db);
    Ok(issue)
}

pub async fn update_issue_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Issue>, ApiError> {
    let status = request
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("status is required"))?
        .parse::<IssueStatus>()
        .map_err(ApiError::bad_request)?;
    let current_member = non_empty(request.current_member_id);

    let db = lock_db(&state)?;
    let issue = db.update_issue_status(&id, status, current_member.as_deref())?;
    refresh_cache(&state, &db);
    Ok(Json(issue))
}

pub async fn delete_issue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = lock_db(&state)?;
    db.delete_issue(&id)?;
    refresh_cache(&state, &db);
    Ok(Json(json!({ "success": true })))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
