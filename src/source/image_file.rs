use super::{Frame, FrameSource};
use crate::error::Result;
use crate::models::SourceKind;
use crate::tools::load_image;
use log::info;
use std::path::Path;

/// Yields one frame read from a single file.
#[derive(Debug)]
pub struct ImageSource {
    frame: Option<Frame>,
}

impl ImageSource {
    /// Load `path` eagerly; a missing or corrupt file fails here.
    pub fn open(path: impl AsRef<Path>, max_dim: Option<u32>) -> Result<Self> {
        let path = path.as_ref();
        let image = load_image(path)?;
        info!("Loaded image {}", path.display());
        let frame = Frame::prepared(image, SourceKind::Image, max_dim).with_path(path);
        Ok(Self { frame: Some(frame) })
    }
}

impl FrameSource for ImageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Image
    }

    fn next_frame(&mut self) -> Option<Result<Frame>> {
        self.frame.take().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use image::{GrayImage, Luma};

    #[test]
    fn yields_exactly_one_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blank.png");
        GrayImage::from_pixel(32, 32, Luma([255]))
            .save(&path)
            .expect("save png");

        let mut source = ImageSource::open(&path, None).expect("open image");
        let frame = source.next_frame().expect("one frame").expect("frame ok");
        assert_eq!(frame.path.as_deref(), Some(path.as_path()));
        assert_eq!(frame.source, SourceKind::Image);
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn missing_file_fails_on_open() {
        let err = ImageSource::open("does/not/exist.png", None).unwrap_err();
        assert!(matches!(err, ScanError::UnreadableImage { .. }));
    }
}
