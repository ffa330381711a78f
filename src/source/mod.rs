//! Source adapters: one interface over the three input modes.
//!
//! Every adapter is a [`FrameSource`], a lazy sequence of frames. Per-item
//! failures come out of the sequence as `Err` items so the pipeline can log
//! and skip them; failures that make the whole source unusable are returned
//! when the source is opened.

use crate::error::Result;
use crate::models::{PixelPoint, SourceKind};
use crate::signal::CancelToken;
use crate::tools;
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Camera capability and the native backend
pub mod camera;
/// Recursive or flat directory scans
pub mod directory;
/// Single image files
pub mod image_file;
/// Live camera frames
pub mod webcam;

pub use camera::{CameraDevice, CameraProvider, SystemCameras};
pub use directory::DirectorySource;
pub use image_file::ImageSource;
pub use webcam::{WebcamOptions, WebcamSource};

/// One image ready for decoding.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixels handed to the decoder, possibly downscaled
    pub image: DynamicImage,
    /// Input mode
    pub source: SourceKind,
    /// File the frame was read from
    pub path: Option<PathBuf>,
    /// Size before any downscaling
    pub original_size: (u32, u32),
    /// 1-based position in the source's sequence
    pub sequence: u64,
}

impl Frame {
    /// Wrap an image at its native size
    pub fn new(image: DynamicImage, source: SourceKind) -> Self {
        let original_size = image.dimensions();
        Self {
            image,
            source,
            path: None,
            original_size,
            sequence: 1,
        }
    }

    /// Wrap an image, downscaling it if it exceeds `max_dim`.
    pub fn prepared(image: DynamicImage, source: SourceKind, max_dim: Option<u32>) -> Self {
        let original_size = image.dimensions();
        Self {
            image: tools::downscale(image, max_dim),
            source,
            path: None,
            original_size,
            sequence: 1,
        }
    }

    /// Attach the originating file
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the sequence number
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Human-readable name for log lines.
    pub fn label(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("{} frame #{}", self.source, self.sequence),
        }
    }

    /// Map a point from decoded-image space back to the original frame,
    /// clamped to its bounds.
    pub fn to_source_coords(&self, p: PixelPoint) -> PixelPoint {
        let (orig_w, orig_h) = self.original_size;
        let (cur_w, cur_h) = self.image.dimensions();
        let p = if (cur_w, cur_h) != (orig_w, orig_h) && cur_w > 0 && cur_h > 0 {
            p.scale(orig_w as f64 / cur_w as f64, orig_h as f64 / cur_h as f64)
        } else {
            p
        };
        p.clamp_to(orig_w, orig_h)
    }
}

/// A lazy sequence of frames.
pub trait FrameSource {
    /// Input mode stamped on records
    fn kind(&self) -> SourceKind;

    /// Next frame, `Some(Err(_))` for a skippable failure, `None` at the end.
    fn next_frame(&mut self) -> Option<Result<Frame>>;
}

/// The three adapters behind one type.
pub enum ScanSource {
    /// Single image file
    Image(ImageSource),
    /// Directory walk
    Directory(DirectorySource),
    /// Camera
    Webcam(WebcamSource),
}

impl FrameSource for ScanSource {
    fn kind(&self) -> SourceKind {
        match self {
            ScanSource::Image(s) => s.kind(),
            ScanSource::Directory(s) => s.kind(),
            ScanSource::Webcam(s) => s.kind(),
        }
    }

    fn next_frame(&mut self) -> Option<Result<Frame>> {
        match self {
            ScanSource::Image(s) => s.next_frame(),
            ScanSource::Directory(s) => s.next_frame(),
            ScanSource::Webcam(s) => s.next_frame(),
        }
    }
}

/// What a front end asked to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    /// One image file
    Image {
        /// File to scan
        path: PathBuf,
    },
    /// Every image under a directory
    Directory {
        /// Directory to walk
        path: PathBuf,
        /// Walk subdirectories
        recursive: bool,
        /// Scan at most this many files, after sorting
        limit: Option<usize>,
    },
    /// Camera frames
    Webcam(WebcamOptions),
}

impl SourceRequest {
    /// Scan a single image
    pub fn image(path: impl AsRef<Path>) -> Self {
        SourceRequest::Image {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Scan a directory
    pub fn directory(path: impl AsRef<Path>, recursive: bool) -> Self {
        SourceRequest::Directory {
            path: path.as_ref().to_path_buf(),
            recursive,
            limit: None,
        }
    }

    /// Cap a directory scan at `max_files` files. Other requests are unchanged.
    pub fn with_limit(mut self, max_files: Option<usize>) -> Self {
        if let SourceRequest::Directory { limit, .. } = &mut self {
            *limit = max_files;
        }
        self
    }

    /// Scan camera `device` for `duration` (zero = until cancelled)
    pub fn webcam(device: u32, duration: Duration, preview: bool) -> Self {
        SourceRequest::Webcam(WebcamOptions {
            device,
            duration: (!duration.is_zero()).then_some(duration),
            preview,
        })
    }

    /// Input mode this request produces
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceRequest::Image { .. } => SourceKind::Image,
            SourceRequest::Directory { .. } => SourceKind::Directory,
            SourceRequest::Webcam(_) => SourceKind::Webcam,
        }
    }

    /// Open the adapter. `cancel` is only consulted by camera sources.
    pub fn open(
        &self,
        max_dim: Option<u32>,
        cameras: &dyn CameraProvider,
        cancel: CancelToken,
    ) -> Result<ScanSource> {
        Ok(match self {
            SourceRequest::Image { path } => ScanSource::Image(ImageSource::open(path, max_dim)?),
            SourceRequest::Directory {
                path,
                recursive,
                limit,
            } => {
                let source = DirectorySource::open(path, *recursive, max_dim)?;
                ScanSource::Directory(match limit {
                    Some(limit) => source.with_limit(*limit),
                    None => source,
                })
            }
            SourceRequest::Webcam(options) => {
                ScanSource::Webcam(WebcamSource::open(cameras, *options, max_dim, cancel)?)
            }
        })
    }
}
