//! Scan sessions: one bounded scan and the records it produced.

use crate::error::{Result, ScanError};
use crate::export::{self, ExportFormat};
use crate::models::ScanRecord;
use chrono::{DateTime, Local};
use log::info;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Ordered, optionally deduplicating record store
pub mod aggregator;

pub use aggregator::Aggregator;

/// Session shared between a scan worker (appends) and a front end (reads).
pub type SharedSession = Arc<Mutex<ScanSession>>;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No scan running
    Idle,
    /// Frames are being decoded
    Scanning,
    /// Results are being written
    Exporting,
}

/// Records collected by one scan.
#[derive(Debug)]
pub struct ScanSession {
    state: SessionState,
    started_at: DateTime<Local>,
    aggregator: Aggregator,
}

impl ScanSession {
    /// Idle session
    pub fn new(dedup: bool) -> Self {
        Self {
            state: SessionState::Idle,
            started_at: Local::now(),
            aggregator: Aggregator::new(dedup),
        }
    }

    /// Idle session behind a mutex
    pub fn shared(dedup: bool) -> SharedSession {
        Arc::new(Mutex::new(Self::new(dedup)))
    }

    /// `Idle -> Scanning`. Fails while another scan or export is running.
    pub fn begin(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(ScanError::ScanInProgress);
        }
        self.state = SessionState::Scanning;
        self.started_at = Local::now();
        info!(
            "Scan session started (dedup {})",
            if self.aggregator.dedup() { "on" } else { "off" }
        );
        Ok(())
    }

    /// Add records produced by the running scan; returns the ones kept.
    pub fn record<I>(&mut self, records: I) -> &[ScanRecord]
    where
        I: IntoIterator<Item = ScanRecord>,
    {
        self.aggregator.add(records)
    }

    /// `Scanning -> Idle`, on completion or cancellation.
    pub fn finish(&mut self) {
        if self.state == SessionState::Scanning {
            self.state = SessionState::Idle;
            info!(
                "Scan session finished with {} code(s)",
                self.aggregator.len()
            );
        }
    }

    /// `Scanning|Idle -> Exporting -> Idle`: write the records to `path`.
    ///
    /// Returns the format actually used.
    pub fn export(&mut self, path: &Path, format: Option<ExportFormat>) -> Result<ExportFormat> {
        if self.state == SessionState::Exporting {
            return Err(ScanError::ScanInProgress);
        }
        self.finish();
        self.state = SessionState::Exporting;
        let format = ExportFormat::resolve(path, format);
        let outcome = export::export(path, format, self.started_at, self.aggregator.records());
        self.state = SessionState::Idle;
        outcome.map(|()| format)
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the latest scan began
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Copy of the records in insertion order
    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.aggregator.snapshot()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.aggregator.len()
    }

    /// True when nothing was found
    pub fn is_empty(&self) -> bool {
        self.aggregator.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PixelPoint, QR_CODE_TYPE, SourceKind};

    fn record(data: &str) -> ScanRecord {
        ScanRecord::new(
            data,
            QR_CODE_TYPE,
            vec![
                PixelPoint::new(0, 0),
                PixelPoint::new(8, 0),
                PixelPoint::new(8, 8),
            ],
            SourceKind::Webcam,
        )
    }

    #[test]
    fn lifecycle_rejects_reentrant_scans() {
        let mut session = ScanSession::new(false);
        assert_eq!(session.state(), SessionState::Idle);
        session.begin().expect("first begin");
        assert_eq!(session.state(), SessionState::Scanning);
        assert!(matches!(session.begin(), Err(ScanError::ScanInProgress)));
        session.finish();
        assert_eq!(session.state(), SessionState::Idle);
        session.begin().expect("begin after finish");
    }

    #[test]
    fn export_ends_the_scan_and_returns_to_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = ScanSession::new(true);
        session.begin().expect("begin");
        session.record([record("a"), record("a"), record("b")]);
        assert_eq!(session.len(), 2);

        let path = dir.path().join("out.json");
        let format = session.export(&path, None).expect("export");
        assert_eq!(format, ExportFormat::Json);
        assert_eq!(session.state(), SessionState::Idle);

        let report = export::from_json(&std::fs::read_to_string(&path).expect("read"))
            .expect("parse");
        assert_eq!(report.total_codes, 2);
        assert_eq!(report.scan_date, session.started_at());
    }

    #[test]
    fn failed_export_still_returns_to_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = ScanSession::new(false);
        session.begin().expect("begin");
        let err = session
            .export(&dir.path().join("missing/out.txt"), None)
            .unwrap_err();
        assert!(matches!(err, ScanError::ExportFailed { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }
}
