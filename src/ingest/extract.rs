use crate::error::ImportError;
use crate::ingest::normalize::{map_issue_type, map_priority, map_status};
use crate::models::candidate::CandidateIssue;
use crate::models::issue::ims_url;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Row 0 is a merged banner in the tracker's export; row 1 carries the column names.
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// Days between the spreadsheet epoch (1899-12-30) and the Unix epoch.
const SERIAL_UNIX_EPOCH_OFFSET: f64 = 25569.0;
const SECONDS_PER_DAY: i64 = 86_400;

const MISSING_VALUE: &str = "N/A";

pub const ISSUE_NUMBER: &str = "Issue Number";
const SUBJECT: &str = "Subject";
const PRODUCT: &str = "Product";
const VERSION: &str = "Version";
const MODULE: &str = "Module";
const CUSTOMER: &str = "Customer";
const PROJECT: &str = "Project";
const REPORTER: &str = "Reporter";
const HANDLER: &str = "Handler";
const OWNER: &str = "Owner";
const CATEGORY: &str = "Category";
const STATUS: &str = "Status";
const SEVERITY: &str = "Severity";
const TAG: &str = "Tag";
const ISSUED_DATE: &str = "Issued date";

/// Column positions resolved from the header row. Only the issue number is required.
#[derive(Debug, Clone)]
struct IssueColumns {
    issue_number: u32,
    subject: Option<u32>,
    product: Option<u32>,
    version: Option<u32>,
    module: Option<u32>,
    customer: Option<u32>,
    project: Option<u32>,
    reporter: Option<u32>,
    handler: Option<u32>,
    owner: Option<u32>,
    category: Option<u32>,
    status: Option<u32>,
    severity: Option<u32>,
    tag: Option<u32>,
    issued_date: Option<u32>,
}

impl IssueColumns {
    fn from_header(header: &HashMap<String, u32>) -> Result<Self, ImportError> {
        let col = |name: &str| header.get(name).copied();

        Ok(Self {
            issue_number: col(ISSUE_NUMBER).ok_or(ImportError::MissingHeader(ISSUE_NUMBER))?,
            subject: col(SUBJECT),
            product: col(PRODUCT),
            version: col(VERSION),
            module: col(MODULE),
            customer: col(CUSTOMER),
            project: col(PROJECT),
            reporter: col(REPORTER),
            handler: col(HANDLER),
            owner: col(OWNER),
            category: col(CATEGORY),
            status: col(STATUS),
            severity: col(SEVERITY),
            tag: col(TAG),
            issued_date: col(ISSUED_DATE),
        })
    }
}

/// Parse workbook bytes (xlsx, xls, xlsb, ods) into candidate issues.
pub fn extract_candidates(bytes: &[u8]) -> Result<Vec<CandidateIssue>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Decode(e.to_string()))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Decode("workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ImportError::Decode(e.to_string()))?;

    candidates_from_range(&range)
}

pub fn extract_candidates_from_path(path: &Path) -> Result<Vec<CandidateIssue>, ImportError> {
    let bytes = std::fs::read(path)?;
    extract_candidates(&bytes)
}

/// Walk a decoded worksheet. Positions are absolute sheet coordinates, so a
/// sheet whose first rows are blank keeps its header on physical row 2.
pub fn candidates_from_range(range: &Range<Data>) -> Result<Vec<CandidateIssue>, ImportError> {
    let Some((last_row, last_col)) = range.end() else {
        return Err(ImportError::MissingHeader(ISSUE_NUMBER));
    };
    let first_col = range.start().map(|(_, col)| col).unwrap_or(0);

    let mut header = HashMap::new();
    for col in first_col..=last_col {
        if let Some(name) = range.get_value((HEADER_ROW, col)).and_then(truthy_text) {
            header.insert(name, col);
        }
    }
    let columns = IssueColumns::from_header(&header)?;

    let mut candidates = Vec::new();
    for row in FIRST_DATA_ROW..=last_row {
        let view = RowView { range, row };
        if view.is_blank(first_col, last_col) {
            continue;
        }

        match decode_row(&view, &columns) {
            Some(candidate) => candidates.push(candidate),
            None => log::debug!("Skipping row {}: no issue number", row + 1),
        }
    }

    Ok(candidates)
}

struct RowView<'a> {
    range: &'a Range<Data>,
    row: u32,
}

impl RowView<'_> {
    fn cell(&self, col: Option<u32>) -> Option<&Data> {
        col.and_then(|c| self.range.get_value((self.row, c)))
    }

    fn text(&self, col: Option<u32>) -> Option<String> {
        self.cell(col).and_then(truthy_text)
    }

    fn text_or(&self, col: Option<u32>, fallback: &str) -> String {
        self.text(col).unwrap_or_else(|| fallback.to_string())
    }

    fn is_blank(&self, first_col: u32, last_col: u32) -> bool {
        (first_col..=last_col).all(|c| matches!(self.cell(Some(c)), None | Some(Data::Empty)))
    }
}

fn decode_row(view: &RowView<'_>, columns: &IssueColumns) -> Option<CandidateIssue> {
    let ims_number = view.text(Some(columns.issue_number))?;

    let product = view.text(columns.product);
    let raw_status = view.text(columns.status);

    let description = [
        (PRODUCT, columns.product),
        (VERSION, columns.version),
        (MODULE, columns.module),
        (CUSTOMER, columns.customer),
        (PROJECT, columns.project),
        (REPORTER, columns.reporter),
        (HANDLER, columns.handler),
        (OWNER, columns.owner),
    ]
    .iter()
    .map(|(label, col)| format!("{label}: {}", view.text_or(*col, MISSING_VALUE)))
    .collect::<Vec<_>>()
    .join("\n");

    let tags = [product.clone(), view.text(columns.tag)]
        .into_iter()
        .flatten()
        .collect();

    let issued_date = view
        .cell(columns.issued_date)
        .and_then(numeric_value)
        .and_then(serial_to_datetime);

    Some(CandidateIssue {
        title: view
            .text(columns.subject)
            .unwrap_or_else(|| format!("IMS-{ims_number}")),
        description,
        issue_type: map_issue_type(view.text(columns.category).as_deref()),
        status: map_status(raw_status.as_deref()),
        priority: map_priority(view.text(columns.severity).as_deref()),
        tags,
        customer: view.text(columns.customer).unwrap_or_default(),
        product: product.unwrap_or_default(),
        issued_date,
        ims_status: raw_status.unwrap_or_default(),
        tracker_url: ims_url(&ims_number),
        ims_number,
    })
}

/// Convert a spreadsheet date serial to a UTC instant, dropping the time of day.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let days = (serial - SERIAL_UNIX_EPOCH_OFFSET).floor() as i64;
    DateTime::from_timestamp(days.checked_mul(SECONDS_PER_DAY)?, 0)
}

fn numeric_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(n) => Some(*n as f64),
        Data::DateTime(dt) => Some(dt.as_f64()),
        _ => None,
    }
}

/// Text of a cell, or `None` for the values a spreadsheet export treats as blank
/// (empty, `""`, `0`, `false`, error cells).
fn truthy_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            (!s.is_empty()).then(|| s.clone())
        }
        Data::Float(f) => (*f != 0.0 && !f.is_nan()).then(|| format_number(*f)),
        Data::Int(n) => (*n != 0).then(|| n.to_string()),
        Data::Bool(b) => b.then(|| "true".to_string()),
        Data::DateTime(dt) => Some(format_number(dt.as_f64())),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
