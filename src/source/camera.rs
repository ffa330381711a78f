use crate::error::Result;
use image::RgbImage;

/// An open camera stream.
///
/// Dropping the device releases the camera. Implementations must not rely on
/// any other cleanup call.
pub trait CameraDevice {
    /// Grab the next frame.
    ///
    /// [`ScanError::Decode`](crate::error::ScanError::Decode) drops just this
    /// frame. Any other `Err` ends the stream.
    fn capture(&mut self) -> Result<RgbImage>;
}

/// Opens camera devices by index.
pub trait CameraProvider: Send + Sync {
    /// Open and start streaming from `device`.
    fn open(&self, device: u32) -> Result<Box<dyn CameraDevice>>;
}

/// Cameras attached to this machine.
///
/// Requires the `webcam` feature; without it every open fails with
/// [`crate::error::ScanError::CameraUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCameras;

impl CameraProvider for SystemCameras {
    #[cfg(feature = "webcam")]
    fn open(&self, device: u32) -> Result<Box<dyn CameraDevice>> {
        Ok(Box::new(native::NativeCamera::open(device)?))
    }

    #[cfg(not(feature = "webcam"))]
    fn open(&self, device: u32) -> Result<Box<dyn CameraDevice>> {
        Err(crate::error::ScanError::camera(
            device,
            "built without webcam support (enable the `webcam` feature)",
        ))
    }
}

#[cfg(feature = "webcam")]
mod native {
    use super::CameraDevice;
    use crate::error::{Result, ScanError};
    use image::RgbImage;
    use log::{info, warn};
    use nokhwa::Camera;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

    pub(super) struct NativeCamera {
        device: u32,
        camera: Camera,
    }

    impl NativeCamera {
        pub(super) fn open(device: u32) -> Result<Self> {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(CameraIndex::Index(device), requested)
                .map_err(|err| ScanError::camera(device, err))?;
            camera
                .open_stream()
                .map_err(|err| ScanError::camera(device, err))?;
            info!(
                "camera {device} opened at {}x{}",
                camera.resolution().width(),
                camera.resolution().height()
            );
            Ok(Self { device, camera })
        }
    }

    impl CameraDevice for NativeCamera {
        fn capture(&mut self) -> Result<RgbImage> {
            let buffer = self
                .camera
                .frame()
                .map_err(|err| ScanError::camera(self.device, err))?;
            let decoded = buffer
                .decode_image::<RgbFormat>()
                .map_err(|err| {
                    ScanError::Decode(format!("camera {} frame: {err}", self.device))
                })?;
            let (width, height) = (decoded.width(), decoded.height());
            RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
                ScanError::Decode(format!(
                    "camera {} frame: short {width}x{height} buffer",
                    self.device
                ))
            })
        }
    }

    impl Drop for NativeCamera {
        fn drop(&mut self) {
            if let Err(err) = self.camera.stop_stream() {
                warn!("camera {} did not stop cleanly: {err}", self.device);
            }
            info!("camera {} released", self.device);
        }
    }
}

#[cfg(all(test, not(feature = "webcam")))]
mod tests {
    use super::*;
    use crate::error::ScanError;

    #[test]
    fn system_cameras_report_missing_support() {
        let err = SystemCameras.open(0).err().expect("open must fail");
        assert!(matches!(err, ScanError::CameraUnavailable { device: 0, .. }));
    }
}
