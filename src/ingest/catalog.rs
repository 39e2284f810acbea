use crate::error::ImportError;
use crate::models::import_file::ImportFile;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// `<owner>_issueList_<digits>.<ext>`, e.g. `park.ms_issueList_202512100006.xlsx`.
fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^_]+)_issueList_(\d+)\.(xlsx|xls)$").expect("valid file name pattern")
    })
}

/// Owner id and timestamp token embedded in an export file name.
pub fn parse_file_name(name: &str) -> (Option<String>, Option<String>) {
    match file_name_pattern().captures(name) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    }
}

/// List importable workbooks in `dir`, newest first. A missing directory is an empty catalog.
pub fn list_import_files(dir: &Path, extensions: &[String]) -> Result<Vec<ImportFile>, ImportError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let Some(dir_str) = dir.to_str() else {
        return Ok(Vec::new());
    };

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", glob::Pattern::escape(dir_str), ext);
        let paths = glob::glob(&pattern)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        for path in paths.flatten() {
            if let Some(file) = describe_file(&path)? {
                files.push(file);
            }
        }
    }

    files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    Ok(files)
}

/// Catalog filtered to files exported by one owner (the part of the member's
/// email before `@`).
pub fn list_import_files_for_owner(
    dir: &Path,
    extensions: &[String],
    owner: &str,
) -> Result<Vec<ImportFile>, ImportError> {
    Ok(list_import_files(dir, extensions)?
        .into_iter()
        .filter(|f| f.member_id.as_deref() == Some(owner))
        .collect())
}

fn describe_file(path: &Path) -> Result<Option<ImportFile>, ImportError> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let (member_id, timestamp) = parse_file_name(name);
    let modified_at: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);

    Ok(Some(ImportFile {
        name: name.to_string(),
        member_id,
        timestamp,
        size: metadata.len(),
        modified_at,
    }))
}

/// Resolve a catalog entry by name. Names that would leave `dir` are treated as absent.
pub fn resolve_import_file(dir: &Path, file_name: &str) -> Result<PathBuf, ImportError> {
    if file_name.trim().is_empty() {
        return Err(ImportError::InputMissing("fileName"));
    }

    let escapes = file_name.contains('/')
        || file_name.contains('\\')
        || file_name == ".."
        || file_name == ".";
    if escapes {
        return Err(ImportError::NotFound(file_name.to_string()));
    }

    let path = dir.join(file_name);
    if !path.is_file() {
        return Err(ImportError::NotFound(file_name.to_string()));
    }
    Ok(path)
}
