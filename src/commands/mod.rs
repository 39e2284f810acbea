pub mod activities;
pub mod db;
pub mod excel;
pub mod issues;
pub mod members;
pub mod projects;
pub mod settings;

use crate::error::{ImportError, StoreError};
use crate::server::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use db::Database;
use serde_json::json;
use std::sync::MutexGuard;

/// Error body returned by every handler: `{"error": ...}`, plus `created` and
/// `imsNumber` when an import stopped part way.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub created: Option<usize>,
    pub ims_number: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            created: None,
            ims_number: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message });
        if let Some(created) = self.created {
            body["created"] = json!(created);
        }
        if let Some(ims_number) = self.ims_number {
            body["imsNumber"] = json!(ims_number);
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InputMissing(field) => ApiError::bad_request(format!("{field} is required")),
            ImportError::NotFound(name) => {
                log::info!("Requested import file not found: {name}");
                ApiError::not_found("File not found")
            }
            ImportError::MissingHeader(column) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Required column \"{column}\" is missing from the header row"),
            ),
            ImportError::Decode(detail) => {
                log::error!("Spreadsheet decode failed: {detail}");
                ApiError::internal("Could not parse the spreadsheet file")
            }
            ImportError::Creation {
                created,
                ims_number,
                source,
            } => {
                let message = format!("Import stopped after {created} issue(s) at {ims_number}: {source}");
                log::error!("{message}");
                ApiError {
                    created: Some(created),
                    ims_number: Some(ims_number),
                    ..ApiError::internal(message)
                }
            }
            ImportError::Io(e) => {
                log::error!("Import IO error: {e}");
                ApiError::internal("Could not read import files")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::not_found(format!("Not found: {what}")),
            StoreError::Invalid(detail) => ApiError::bad_request(detail),
            other => {
                log::error!("{other}");
                ApiError::internal("Database error")
            }
        }
    }
}

pub(crate) fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Database>, ApiError> {
    state
        .db
        .lock()
        .map_err(|_| ApiError::internal("Database lock error"))
}

/// Re-read the dashboard snapshot after a committed write. The write already
/// succeeded, so a failed refresh is logged and the stale snapshot is kept.
pub(crate) fn refresh_cache(state: &AppState, db: &Database) {
    let Ok(mut cache) = state.cache.lock() else {
        log::warn!("Cache lock error; snapshot not refreshed");
        return;
    };
    if let Err(e) = cache.refresh(db, state.settings.activity_feed_limit) {
        log::warn!("Cache refresh failed: {e}");
    }
}
