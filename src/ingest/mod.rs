//! Spreadsheet ingestion: catalog the export directory, extract candidate
//! issues from a workbook, then reconcile them against what is already stored.

pub mod catalog;
pub mod extract;
pub mod normalize;
pub mod reconcile;
