//! qr_scanner - find QR codes in camera frames, image files and directories
//!
//! Every input mode is a [`source::FrameSource`]. Frames go through the
//! [`decoder::DecodeInvoker`], which turns detections into
//! [`ScanRecord`]s, and the records collect in a [`session::ScanSession`]
//! that can be exported as JSON or plain text.
//!
//! Camera scans run on a [`worker::ScanWorker`] thread and are stopped by a
//! message; file scans can run inline:
//!
//! ```no_run
//! use qr_scanner::{ScanConfig, SourceRequest, scan_blocking};
//!
//! let (session, summary) =
//!     scan_blocking(&SourceRequest::directory("shots", true), &ScanConfig::default())?;
//! println!("{} frame(s), {} code(s)", summary.frames, session.len());
//! # Ok::<(), qr_scanner::ScanError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Settings from defaults and the environment
pub mod config;
/// Decode capability and the per-frame invoker
pub mod decoder;
/// Error type shared by the whole crate
pub mod error;
/// JSON and text reports
pub mod export;
/// Command line output and the interactive shell
pub mod front;
/// Logger setup and log file rotation
pub mod logging;
/// Result records and geometry
pub mod models;
/// Frame loop tying sources, decoder and session together
pub mod pipeline;
/// Scan state and result aggregation
pub mod session;
/// Cancellation messages
pub mod signal;
/// Input adapters (webcam, image, directory)
pub mod source;
/// Image loading and file helpers
pub mod tools;
/// Background scan thread
pub mod worker;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use export::ExportFormat;
pub use models::{ScanRecord, SourceKind};
pub use pipeline::ScanSummary;
pub use session::ScanSession;
pub use source::SourceRequest;

use decoder::{DecodeInvoker, QrDecoder};
use parking_lot::Mutex;
use signal::CancelToken;
use source::SystemCameras;

/// Run one scan on the calling thread and return its session.
///
/// Camera requests need a duration here, since nothing can cancel them.
pub fn scan_blocking(
    request: &SourceRequest,
    config: &ScanConfig,
) -> Result<(ScanSession, ScanSummary)> {
    let invoker = DecodeInvoker::new(QrDecoder::new(), config.invoker_options());
    let session = Mutex::new(ScanSession::new(config.dedup_for(request.kind())));
    let mut source = request.open(config.max_dimension, &SystemCameras, CancelToken::never())?;
    let summary = pipeline::run_scan(&mut source, &invoker, &session, config.parallel, |_| {})?;
    Ok((session.into_inner(), summary))
}

/// Every QR code in one image file.
pub fn scan_image(path: impl AsRef<std::path::Path>) -> Result<Vec<ScanRecord>> {
    let (session, _) = scan_blocking(&SourceRequest::image(path), &ScanConfig::default())?;
    Ok(session.snapshot())
}

/// Every QR code under a directory, in path order.
pub fn scan_directory(
    path: impl AsRef<std::path::Path>,
    recursive: bool,
) -> Result<Vec<ScanRecord>> {
    let request = SourceRequest::directory(path, recursive);
    let (session, _) = scan_blocking(&request, &ScanConfig::default())?;
    Ok(session.snapshot())
}
