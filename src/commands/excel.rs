use crate::commands::settings::Settings;
use crate::commands::{lock_db, refresh_cache, ApiError};
use crate::error::ImportError;
use crate::ingest::catalog::{list_import_files, list_import_files_for_owner, resolve_import_file};
use crate::ingest::extract::extract_candidates_from_path;
use crate::ingest::reconcile::{import_candidates, ImportOutcome, ImportReport, ImportRequest, ImportSelection};
use crate::models::candidate::CandidateIssue;
use crate::models::import_file::ImportFile;
use crate::server::{AppState, SharedState};
use crate::store::IssueStore;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesQuery {
    pub member_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<ImportFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub success: bool,
    pub file_name: String,
    pub total_count: usize,
    pub issues: Vec<CandidateIssue>,
}

/// Either a catalog file to parse server-side, or candidates the client
/// already holds from an earlier `/parse`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIssuesRequest {
    pub project_id: Option<String>,
    pub member_id: Option<String>,
    pub file_name: Option<String>,
    pub issues: Option<Vec<CandidateIssue>>,
    pub selected: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub status: String,
    #[serde(flatten)]
    pub report: ImportReport,
}

pub async fn list_files(
    State(state): State<SharedState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = list_files_internal(&state.settings, query.member_id.as_deref())?;
    Ok(Json(FileListResponse { files }))
}

pub fn list_files_internal(settings: &Settings, owner: Option<&str>) -> Result<Vec<ImportFile>, ImportError> {
    match owner.filter(|o| !o.is_empty()) {
        Some(owner) => list_import_files_for_owner(&settings.import_dir, &settings.import_extensions, owner),
        None => list_import_files(&settings.import_dir, &settings.import_extensions),
    }
}

pub async fn parse_file(
    State(state): State<SharedState>,
    request: Option<Json<ParseRequest>>,
) -> Result<Json<ParseResponse>, ApiError> {
    let file_name = request
        .and_then(|Json(body)| body.file_name)
        .unwrap_or_default();
    let issues = parse_file_internal(&state.settings, &file_name)?;

    Ok(Json(ParseResponse {
        success: true,
        total_count: issues.len(),
        file_name,
        issues,
    }))
}

pub fn parse_file_internal(settings: &Settings, file_name: &str) -> Result<Vec<CandidateIssue>, ImportError> {
    let path = resolve_import_file(&settings.import_dir, file_name)?;
    let issues = extract_candidates_from_path(&path)?;
    log::info!("Parsed {file_name}: {} candidate issues", issues.len());
    Ok(issues)
}

pub async fn import_issues(
    State(state): State<SharedState>,
    Json(request): Json<ImportIssuesRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let outcome = import_issues_internal(&state, request)?;

    let response = match outcome {
        ImportOutcome::ProjectRequired => ImportResponse {
            status: "project_required".to_string(),
            report: ImportReport {
                created: 0,
                skipped_existing: Vec::new(),
                skipped_repeated: Vec::new(),
                deselected: 0,
                skipped_missing_id: 0,
                issues: Vec::new(),
            },
        },
        ImportOutcome::Imported(report) => ImportResponse {
            status: "imported".to_string(),
            report,
        },
    };
    Ok(Json(response))
}

/// Resolve the candidate list, then reconcile it against a snapshot read under
/// the same connection lock that guards the creations.
pub fn import_issues_internal(state: &AppState, request: ImportIssuesRequest) -> Result<ImportOutcome, ApiError> {
    let candidates = match (request.issues, request.file_name.as_deref()) {
        (Some(issues), _) => issues,
        (None, Some(file_name)) => parse_file_internal(&state.settings, file_name)?,
        (None, None) => return Err(ImportError::InputMissing("fileName").into()),
    };

    let import_request = ImportRequest {
        project_id: request.project_id,
        member_id: request.member_id.unwrap_or_default(),
        selection: ImportSelection::from_ids(request.selected),
    };

    let db = lock_db(state)?;
    let existing = db.find_all_issues()?;

    let result = import_candidates(&*db, &import_request, &candidates, &existing, |progress| {
        log::debug!(
            "Import progress {}/{} ({})",
            progress.completed,
            progress.total,
            progress.ims_number
        );
    });

    let wrote_any = match &result {
        Ok(ImportOutcome::Imported(report)) => report.created > 0,
        Err(err) => err.created_before_failure() > 0,
        _ => false,
    };
    if wrote_any {
        refresh_cache(state, &db);
    }

    result.map_err(ApiError::from)
}
