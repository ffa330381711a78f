//! Drives one scan: pulls frames from a source, decodes them and appends the
//! results to a session.

use crate::decoder::{DecodeInvoker, Decoder};
use crate::error::Result;
use crate::models::ScanRecord;
use crate::session::ScanSession;
use crate::source::{FrameSource, ScanSource};
use log::{info, warn};
use parking_lot::Mutex;

/// Counters for a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Frames decoded
    pub frames: u64,
    /// Items that could not be read
    pub skipped: u64,
    /// Records produced by the decoder
    pub detected: usize,
    /// Records the session kept after dedup
    pub added: usize,
}

/// What one decoded frame contributed.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Position in the source's sequence
    pub sequence: u64,
    /// File path or frame number
    pub label: String,
    /// Records produced by the decoder for this frame
    pub detected: usize,
    /// Records the session kept
    pub added: Vec<ScanRecord>,
}

/// Run `source` to exhaustion (or cancellation) against `session`.
///
/// The session goes `Idle -> Scanning -> Idle`; unreadable items are logged
/// and counted as skipped, any other source error ends the scan. With `parallel` set, directory sources decode on
/// the rayon pool and report in path order. The session lock is only held
/// while appending.
pub fn run_scan<D, F>(
    source: &mut ScanSource,
    invoker: &DecodeInvoker<D>,
    session: &Mutex<ScanSession>,
    parallel: bool,
    mut observer: F,
) -> Result<ScanSummary>
where
    D: Decoder,
    F: FnMut(&FrameReport),
{
    session.lock().begin()?;
    let kind = source.kind();
    info!("Starting {kind} scan");

    let mut summary = ScanSummary::default();

    if parallel {
        if let ScanSource::Directory(dir) = source {
            let outcomes = dir.decode_remaining(invoker);
            for (index, (path, outcome)) in outcomes.into_iter().enumerate() {
                match outcome {
                    Ok(records) => {
                        let label = path.display().to_string();
                        let sequence = index as u64 + 1;
                        absorb(&mut summary, session, sequence, label, records, &mut observer);
                    }
                    Err(err) if err.is_per_item() => {
                        warn!("{err}");
                        summary.skipped += 1;
                    }
                    Err(err) => {
                        session.lock().finish();
                        return Err(err);
                    }
                }
            }
        }
    }

    while let Some(item) = source.next_frame() {
        match item {
            Ok(frame) => {
                let records = invoker.process(&frame);
                let label = frame.label();
                absorb(&mut summary, session, frame.sequence, label, records, &mut observer);
            }
            Err(err) if err.is_per_item() => {
                warn!("{err}");
                summary.skipped += 1;
            }
            Err(err) => {
                session.lock().finish();
                return Err(err);
            }
        }
    }

    session.lock().finish();
    info!(
        "{kind} scan done: {} frame(s), {} skipped, {} detected, {} kept",
        summary.frames, summary.skipped, summary.detected, summary.added
    );
    Ok(summary)
}

fn absorb<F>(
    summary: &mut ScanSummary,
    session: &Mutex<ScanSession>,
    sequence: u64,
    label: String,
    records: Vec<ScanRecord>,
    observer: &mut F,
) where
    F: FnMut(&FrameReport),
{
    summary.frames += 1;
    let detected = records.len();
    summary.detected += detected;
    let added = if records.is_empty() {
        Vec::new()
    } else {
        session.lock().record(records).to_vec()
    };
    summary.added += added.len();
    for record in &added {
        info!("Detected QR code: {} ({label})", record.data);
    }
    observer(&FrameReport {
        sequence,
        label,
        detected,
        added,
    });
}
