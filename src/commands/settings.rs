use crate::commands::ApiError;
use crate::ingest::catalog::DEFAULT_EXTENSIONS;
use crate::server::SharedState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;
const DATA_DIR_ENV: &str = "SUPPORTDESK_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "data";
const KNOWN_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Settings resolved to concrete paths, ready for the server to use.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub import_dir: PathBuf,
    pub database_path: PathBuf,
    pub listen_addr: String,
    pub import_extensions: Vec<String>,
    pub activity_feed_limit: usize,
}

pub async fn get_settings(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    load_settings_from_disk(&state.settings.data_dir)
        .map(Json)
        .map_err(ApiError::internal)
}

/// Persists a partial update. Paths and the listen address apply on next start.
pub async fn save_settings(
    State(state): State<SharedState>,
    Json(settings): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    save_settings_to_disk(&state.settings.data_dir, settings)
        .map(Json)
        .map_err(ApiError::internal)
}

/// Data directory from `SUPPORTDESK_DATA_DIR`, or `./data`.
pub fn data_dir_from_env() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn load_effective_settings(data_dir: &Path) -> Result<Settings, String> {
    let settings = load_settings_from_disk(data_dir)?;

    let import_dir = resolve_path(data_dir, settings["importDir"].as_str().unwrap_or("excels"));
    let database_path = resolve_path(
        data_dir,
        settings["databaseFile"].as_str().unwrap_or("supportdesk.db"),
    );
    let listen_addr = settings["listenAddr"]
        .as_str()
        .unwrap_or("127.0.0.1:3000")
        .to_string();
    let import_extensions = settings["importExtensions"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let activity_feed_limit = settings["activityFeedLimit"].as_u64().unwrap_or(50) as usize;

    Ok(Settings {
        data_dir: data_dir.to_path_buf(),
        import_dir,
        database_path,
        listen_addr,
        import_extensions,
        activity_feed_limit,
    })
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, using defaults: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

fn resolve_path(data_dir: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        data_dir.join(candidate)
    }
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory {}: {e}", data_dir.display()))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 2 {
        rename_key(&mut out, "excelDir", "importDir");
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "importDir": "excels",
        "databaseFile": "supportdesk.db",
        "listenAddr": "127.0.0.1:3000",
        "importExtensions": DEFAULT_EXTENSIONS,
        "activityFeedLimit": 50
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn rename_key(target: &mut Value, from: &str, to: &str) {
    let Some(obj) = target.as_object_mut() else {
        return;
    };
    if let Some(value) = obj.remove(from) {
        obj.entry(to.to_string()).or_insert(value);
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "activityFeedLimit", 10, 500, 50);

    ensure_non_empty_str(obj, "importDir", "excels");
    ensure_non_empty_str(obj, "databaseFile", "supportdesk.db");
    ensure_non_empty_str(obj, "listenAddr", "127.0.0.1:3000");

    sanitize_extensions(obj, "importExtensions");
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_non_empty_str(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn sanitize_extensions(map: &mut Map<String, Value>, key: &str) {
    let mut kept: Vec<String> = Vec::new();
    if let Some(items) = map.get(key).and_then(Value::as_array) {
        for item in items.iter().filter_map(Value::as_str) {
            let ext = item.trim().trim_start_matches('.').to_ascii_lowercase();
            if KNOWN_EXTENSIONS.contains(&ext.as_str()) && !kept.contains(&ext) {
                kept.push(ext);
            }
        }
    }

    if kept.is_empty() {
        kept = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    }
    map.insert(key.to_string(), json!(kept));
}
