//! Writing scan results to disk.
//!
//! The format follows the destination's extension (`.json` is JSON, anything
//! else is the text report) unless the caller names one explicitly. Files are
//! written to a temporary sibling first and renamed into place, so a failed
//! export never leaves a partial file behind.

use crate::error::{Result, ScanError};
use crate::models::ScanRecord;
use chrono::{DateTime, Local};
use log::info;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

/// JSON report
pub mod json;
/// Plain-text report
pub mod text;

pub use json::{JsonReport, from_json, to_json};
pub use text::to_text;

/// Export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `{scan_date, total_codes, results}` object
    Json,
    /// Numbered human-readable report
    Text,
}

impl ExportFormat {
    /// Format implied by a destination path.
    pub fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }

    /// Explicit choice if given, else the path's.
    pub fn resolve(path: &Path, explicit: Option<ExportFormat>) -> Self {
        explicit.unwrap_or_else(|| Self::for_path(path))
    }

    /// Name accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "text",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ScanError::UnsupportedOutputFormat(s.trim().to_string())),
        }
    }
}

/// Render records in `format`.
pub fn render(
    format: ExportFormat,
    scan_date: DateTime<Local>,
    records: &[ScanRecord],
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => to_json(scan_date, records),
        ExportFormat::Text => Ok(to_text(scan_date, records)),
    }
}

/// Render and atomically write records to `path`.
///
/// On failure the destination is untouched and [`ScanError::ExportFailed`]
/// is returned.
pub fn export(
    path: &Path,
    format: ExportFormat,
    scan_date: DateTime<Local>,
    records: &[ScanRecord],
) -> Result<()> {
    let failed = |source: io::Error| ScanError::ExportFailed {
        path: path.to_path_buf(),
        source,
    };
    let content = render(format, scan_date, records).map_err(|err| failed(err.into()))?;
    write_atomic(path, content.as_bytes()).map_err(failed)?;
    info!(
        "Results saved to {} ({format}, {} codes)",
        path.display(),
        records.len()
    );
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".qr_export")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PixelPoint, QR_CODE_TYPE, SourceKind};
    use std::fs;

    fn sample() -> Vec<ScanRecord> {
        vec![ScanRecord::new(
            "https://example.com",
            QR_CODE_TYPE,
            vec![
                PixelPoint::new(4, 4),
                PixelPoint::new(60, 4),
                PixelPoint::new(60, 60),
                PixelPoint::new(4, 60),
            ],
            SourceKind::Image,
        )]
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ExportFormat::for_path(Path::new("out.json")),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::for_path(Path::new("OUT.JSON")),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::for_path(Path::new("out.txt")),
            ExportFormat::Text
        );
        assert_eq!(ExportFormat::for_path(Path::new("out")), ExportFormat::Text);
        assert_eq!(
            ExportFormat::resolve(Path::new("out.txt"), Some(ExportFormat::Json)),
            ExportFormat::Json
        );
    }

    #[test]
    fn unknown_format_names_are_rejected() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedOutputFormat(name) if name == "xml"));
    }

    #[test]
    fn export_writes_the_whole_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("result.txt");
        export(&path, ExportFormat::Text, Local::now(), &sample()).expect("export");
        let body = fs::read_to_string(&path).expect("read export");
        assert!(body.contains("Data: https://example.com"));
        let leftovers = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1, "temporary file must not linger");
    }

    #[test]
    fn failed_export_leaves_destination_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("taken.json");
        fs::create_dir(&target).expect("occupy target with a directory");

        let err = export(&target, ExportFormat::Json, Local::now(), &sample()).unwrap_err();
        assert!(matches!(err, ScanError::ExportFailed { .. }));
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).expect("list").count(), 0);
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 1);
    }

    #[test]
    fn missing_parent_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("no/such/dir/out.json");
        let err = export(&target, ExportFormat::Json, Local::now(), &sample()).unwrap_err();
        assert!(matches!(err, ScanError::ExportFailed { .. }));
        assert!(!target.exists());
    }
}
