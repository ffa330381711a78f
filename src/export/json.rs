use crate::models::ScanRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ReportRef<'a> {
    scan_date: DateTime<Local>,
    total_codes: usize,
    results: &'a [ScanRecord],
}

/// A parsed JSON export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonReport {
    /// Session start
    pub scan_date: DateTime<Local>,
    /// Number of records
    pub total_codes: usize,
    /// Records in scan order
    pub results: Vec<ScanRecord>,
}

/// Pretty-printed JSON report.
pub fn to_json(scan_date: DateTime<Local>, records: &[ScanRecord]) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(&ReportRef {
        scan_date,
        total_codes: records.len(),
        results: records,
    })?;
    out.push('\n');
    Ok(out)
}

/// Parse a report written by [`to_json`].
pub fn from_json(input: &str) -> serde_json::Result<JsonReport> {
    serde_json::from_str(input)
}
