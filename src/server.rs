use crate::commands::db::Database;
use crate::commands::settings::Settings;
use crate::commands::{activities, excel, issues, members, projects, settings};
use crate::error::StoreResult;
use crate::store::StoreCache;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

pub struct AppState {
    /// One connection; holding the lock serializes writers, imports included.
    pub db: Mutex<Database>,
    pub cache: Mutex<StoreCache>,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn open(settings: Settings) -> StoreResult<Self> {
        let db = Database::open(&settings.database_path)?;
        Self::with_database(db, settings)
    }

    pub fn with_database(db: Database, settings: Settings) -> StoreResult<Self> {
        let mut cache = StoreCache::default();
        cache.refresh(&db, settings.activity_feed_limit)?;

        Ok(Self {
            db: Mutex::new(db),
            cache: Mutex::new(cache),
            settings,
        })
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "supportdesk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/files", get(excel::list_files))
        .route("/api/excel", get(excel::list_files))
        .route("/parse", post(excel::parse_file))
        .route("/api/excel/parse", post(excel::parse_file))
        .route("/import", post(excel::import_issues))
        .route("/api/excel/import", post(excel::import_issues))
        .route("/api/members", get(members::list_members).post(members::create_member))
        .route("/api/members/:id", get(members::get_member))
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/api/projects/:id",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/api/issues", get(issues::list_issues).post(issues::create_issue))
        .route(
            "/api/issues/:id",
            get(issues::get_issue)
                .patch(issues::update_issue_status)
                .delete(issues::delete_issue),
        )
        .route(
            "/api/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route("/api/dashboard", get(activities::dashboard))
        .route("/api/settings", get(settings::get_settings).put(settings::save_settings))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub async fn serve(settings: Settings) -> Result<(), String> {
    let listen_addr = settings.listen_addr.clone();
    let import_dir = settings.import_dir.clone();
    let state = AppState::open(settings).map_err(|e| format!("Failed to open database: {e}"))?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| format!("Failed to bind {listen_addr}: {e}"))?;

    log::info!("Supportdesk listening on http://{listen_addr}");
    log::info!("Import directory: {}", import_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await
        .map_err(|e| format!("Server error: {e}"))
}
