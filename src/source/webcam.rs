use super::{CameraDevice, CameraProvider, Frame, FrameSource};
use crate::error::Result;
use crate::models::SourceKind;
use crate::signal::CancelToken;
use image::DynamicImage;
use log::{info, warn};
use std::time::{Duration, Instant};

/// Camera scan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebcamOptions {
    /// Camera index
    pub device: u32,
    /// Stop after this long; `None` runs until cancelled
    pub duration: Option<Duration>,
    /// Show detections live and accept a quit key
    pub preview: bool,
}

/// Frames from a camera until the deadline, a cancel request, or end of stream.
///
/// The source owns the camera for its whole life. The device is dropped, and
/// so released, as soon as the sequence ends or the source is dropped.
pub struct WebcamSource {
    camera: Option<Box<dyn CameraDevice>>,
    options: WebcamOptions,
    cancel: CancelToken,
    started: Instant,
    frames: u64,
    max_dim: Option<u32>,
}

impl WebcamSource {
    /// Open `options.device` through `cameras`.
    pub fn open(
        cameras: &dyn CameraProvider,
        options: WebcamOptions,
        max_dim: Option<u32>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let camera = cameras.open(options.device)?;
        match options.duration {
            Some(limit) => info!(
                "Starting webcam scan on device {} for {}s",
                options.device,
                limit.as_secs_f32()
            ),
            None => info!(
                "Starting webcam scan on device {} until cancelled",
                options.device
            ),
        }
        Ok(Self {
            camera: Some(camera),
            options,
            cancel,
            started: Instant::now(),
            frames: 0,
            max_dim,
        })
    }

    /// Scan parameters
    pub fn options(&self) -> WebcamOptions {
        self.options
    }

    /// Frames captured so far
    pub fn frames_captured(&self) -> u64 {
        self.frames
    }

    /// True while the camera is held
    pub fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn release(&mut self, reason: &str) {
        if self.camera.take().is_some() {
            info!(
                "Webcam scan ended ({reason}) after {} frames in {:.1}s",
                self.frames,
                self.started.elapsed().as_secs_f32()
            );
        }
    }
}

impl FrameSource for WebcamSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Webcam
    }

    fn next_frame(&mut self) -> Option<Result<Frame>> {
        if self.cancel.is_cancelled() {
            self.release("cancelled");
            return None;
        }
        let started = self.started;
        if self
            .options
            .duration
            .is_some_and(|limit| started.elapsed() >= limit)
        {
            self.release("duration elapsed");
            return None;
        }

        let captured = self.camera.as_mut()?.capture();
        match captured {
            Ok(rgb) => {
                self.frames += 1;
                let frame = Frame::prepared(
                    DynamicImage::ImageRgb8(rgb),
                    SourceKind::Webcam,
                    self.max_dim,
                )
                .with_sequence(self.frames);
                Some(Ok(frame))
            }
            Err(err) if err.is_per_item() => Some(Err(err)),
            Err(err) => {
                warn!("camera stream ended: {err}");
                self.release("end of stream");
                None
            }
        }
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        self.release("dropped");
    }
}
