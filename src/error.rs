//! Error types for the import pipeline and the SQLite store.
//!
//! Only whole-file failures and persistence failures surface here; row-level
//! gaps in a spreadsheet are absorbed by field defaults during extraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid value: {0}")]
    Invalid(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// A required request field (file name, acting member) was not supplied.
    #[error("{0} is required")]
    InputMissing(&'static str),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Could not decode workbook: {0}")]
    Decode(String),

    /// The header row lacks a column the extractor cannot work without.
    #[error("Required column \"{0}\" is missing from the header row")]
    MissingHeader(&'static str),

    /// A creation failed mid-import. `created` pairs were already committed.
    #[error("Import stopped after {created} issue(s) at {ims_number}: {source}")]
    Creation {
        created: usize,
        ims_number: String,
        #[source]
        source: StoreError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Number of issues that were persisted before the error, if any.
    pub fn created_before_failure(&self) -> usize {
        match self {
            ImportError::Creation { created, .. } => *created,
            _ => 0,
        }
    }
}
