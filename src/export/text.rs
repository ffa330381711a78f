use crate::models::ScanRecord;
use chrono::{DateTime, Local, SecondsFormat};
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

/// Human-readable report: a header, then one numbered block per record.
pub fn to_text(scan_date: DateTime<Local>, records: &[ScanRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QR Code Scan Results");
    let _ = writeln!(out, "Date: {}", scan_date.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Total Codes Found: {}", records.len());
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out.push('\n');

    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "Code #{}", i + 1);
        let _ = writeln!(out, "Data: {}", record.data);
        let _ = writeln!(out, "Type: {}", record.code_type);
        let _ = writeln!(out, "Source: {}", record.source);
        if let Some(path) = &record.path {
            let _ = writeln!(out, "Path: {}", path.display());
        }
        let _ = writeln!(
            out,
            "Timestamp: {}",
            record
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, false)
        );
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PixelPoint, QR_CODE_TYPE, SourceKind};
    use chrono::TimeZone;

    #[test]
    fn report_lists_each_record() {
        let date = Local
            .with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
            .single()
            .expect("valid local time");
        let polygon = vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(5, 0),
            PixelPoint::new(5, 5),
        ];
        let records = vec![
            ScanRecord::new("first", QR_CODE_TYPE, polygon.clone(), SourceKind::Image)
                .with_path("a.png"),
            ScanRecord::new("second", QR_CODE_TYPE, polygon, SourceKind::Webcam),
        ];
        let text = to_text(date, &records);

        assert!(text.starts_with("QR Code Scan Results\nDate: 2024-06-01 09:30:00\n"));
        assert!(text.contains("Total Codes Found: 2\n"));
        assert!(text.contains("Code #1\nData: first\nType: QRCODE\nSource: image\nPath: a.png\n"));
        assert!(text.contains("Code #2\nData: second\nType: QRCODE\nSource: webcam\nTimestamp: "));
    }

    #[test]
    fn empty_report_has_only_the_header() {
        let text = to_text(Local::now(), &[]);
        assert!(text.contains("Total Codes Found: 0"));
        assert!(!text.contains("Code #"));
    }
}
