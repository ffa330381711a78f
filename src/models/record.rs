use super::{BoundingRect, PixelPoint};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Symbol type tag stamped on QR detections.
pub const QR_CODE_TYPE: &str = "QRCODE";

/// Where a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live camera frames
    Webcam,
    /// A single image file
    Image,
    /// Files found under a directory
    Directory,
}

impl SourceKind {
    /// Lowercase name used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Webcam => "webcam",
            SourceKind::Image => "image",
            SourceKind::Directory => "directory",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Decoded payload. Empty only for located-but-unreadable symbols.
    pub data: String,
    /// Symbol type, e.g. `QRCODE`
    #[serde(alias = "type")]
    pub code_type: String,
    /// Axis-aligned box around `polygon`
    #[serde(rename = "rect", alias = "bounding_rect")]
    pub bounding_rect: BoundingRect,
    /// Detected outline, in order
    pub polygon: Vec<PixelPoint>,
    /// Input mode that produced the frame
    pub source: SourceKind,
    /// When the detection was produced
    pub timestamp: DateTime<Local>,
    /// Image file the code was found in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ScanRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        data: impl Into<String>,
        code_type: impl Into<String>,
        polygon: Vec<PixelPoint>,
        source: SourceKind,
    ) -> Self {
        let bounding_rect = BoundingRect::enclosing(&polygon);
        Self {
            data: data.into(),
            code_type: code_type.into(),
            bounding_rect,
            polygon,
            source,
            timestamp: Local::now(),
            path: None,
        }
    }

    /// Attach the file the record came from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Dedup identity: payload and symbol type, nothing else.
    pub fn same_code(&self, other: &ScanRecord) -> bool {
        self.data == other.data && self.code_type == other.code_type
    }

    /// True when the symbol was located but not decoded.
    pub fn is_undecoded(&self) -> bool {
        self.data.is_empty()
    }
}
