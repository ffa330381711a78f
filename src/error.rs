//! Error types shared by every scan stage.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Failures surfaced by sources, the decode invoker, and the exporter.
///
/// Per-item failures (one unreadable file in a directory, one frame that
/// fails to decode) are logged and skipped by the pipeline. Everything else
/// ends the current operation.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The image is missing, in an unsupported format, or corrupt.
    #[error("unreadable image {}: {reason}", path.display())]
    UnreadableImage {
        /// Path that failed to load
        path: PathBuf,
        /// Loader error message
        reason: String,
    },

    /// The camera device could not be opened.
    #[error("camera {device} unavailable: {reason}")]
    CameraUnavailable {
        /// Device index that was requested
        device: u32,
        /// Backend error message
        reason: String,
    },

    /// An export format was requested by a name nobody recognizes.
    #[error("unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    /// Writing the export failed; the destination was left untouched.
    #[error("export to {} failed: {source}", path.display())]
    ExportFailed {
        /// Requested destination
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The front end was given an unusable combination of options.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A scan was started while another one is still running in the session.
    #[error("a scan is already in progress")]
    ScanInProgress,

    /// The decode capability rejected a frame.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The scan worker thread could not be started or died.
    #[error("scan worker failed: {0}")]
    Worker(String),
}

impl ScanError {
    /// Build an [`ScanError::UnreadableImage`] from anything printable.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ScanError::UnreadableImage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`ScanError::CameraUnavailable`] from anything printable.
    pub fn camera(device: u32, reason: impl ToString) -> Self {
        ScanError::CameraUnavailable {
            device,
            reason: reason.to_string(),
        }
    }

    /// True for failures that only affect a single image or frame.
    pub fn is_per_item(&self) -> bool {
        matches!(self, ScanError::UnreadableImage { .. } | ScanError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_message_names_the_path() {
        let err = ScanError::unreadable("shots/missing.png", "file not found");
        assert_eq!(
            err.to_string(),
            "unreadable image shots/missing.png: file not found"
        );
        assert!(err.is_per_item());
    }

    #[test]
    fn session_level_errors_are_not_per_item() {
        assert!(!ScanError::camera(0, "busy").is_per_item());
        assert!(!ScanError::ScanInProgress.is_per_item());
        assert!(!ScanError::UnsupportedOutputFormat("xml".into()).is_per_item());
    }
}
