use crate::commands::issues::non_empty;
use crate::commands::{lock_db, ApiError};
use crate::models::member::{Member, NewMember};
use crate::server::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub name: Option<String>,
    pub name_ja: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
}

pub async fn list_members(State(state): State<SharedState>) -> Result<Json<Vec<Member>>, ApiError> {
    let db = lock_db(&state)?;
    Ok(Json(db.list_members()?))
}

pub async fn get_member(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Member>, ApiError> {
    let db = lock_db(&state)?;
    db.get_member(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Member not found"))
}

pub async fn create_member(
    State(state): State<SharedState>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let (Some(name), Some(email)) = (non_empty(request.name), non_empty(request.email)) else {
        return Err(ApiError::bad_request("name, email are required"));
    };

    let fields = NewMember {
        name,
        name_ja: non_empty(request.name_ja),
        email,
        avatar: request.avatar.unwrap_or_default(),
        role: non_empty(request.role).unwrap_or_else(|| "member".to_string()),
        department: non_empty(request.department),
    };

    let db = lock_db(&state)?;
    let member = db.create_member(&fields)?;
    log::info!("Member {} created", member.file_owner_id());
    Ok((StatusCode::CREATED, Json(member)))
}
