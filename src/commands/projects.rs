use crate::commands::issues::non_empty;
use crate::commands::{lock_db, refresh_cache, ApiError};
use crate::models::issue::Priority;
use crate::models::project::{NewProject, Project};
use crate::server::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub customer: Option<String>,
    pub member_ids: Option<Vec<String>>,
    pub current_member_id: Option<String>,
}

pub async fn list_projects(State(state): State<SharedState>) -> Result<Json<Vec<Project>>, ApiError> {
    let db = lock_db(&state)?;
    Ok(Json(db.list_projects()?))
}

pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let db = lock_db(&state)?;
    db.get_project(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

pub async fn create_project(
    State(state): State<SharedState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let (Some(name), Some(description), Some(start_date), Some(due_date), Some(customer)) = (
        non_empty(request.name),
        non_empty(request.description),
        request.start_date,
        request.due_date,
        non_empty(request.customer),
    ) else {
        return Err(ApiError::bad_request("Required fields are missing"));
    };

    let fields = NewProject {
        name,
        description,
        status: non_empty(request.status).unwrap_or_else(|| "backlog".to_string()),
        priority: request.priority.unwrap_or(Priority::Medium),
        start_date,
        due_date,
        customer,
        member_ids: request.member_ids.unwrap_or_default(),
    };
    let current_member = non_empty(request.current_member_id);

    let db = lock_db(&state)?;
    let project = db.create_project(&fields, current_member.as_deref())?;
    refresh_cache(&state, &db);
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = lock_db(&state)?;
    db.delete_project(&id)?;
    refresh_cache(&state, &db);
    Ok(Json(json!({ "success": true })))
}
