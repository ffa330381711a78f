use super::{Decoder, RawDetection};
use crate::error::{Result, ScanError};
use crate::models::{PixelPoint, QR_CODE_TYPE};
use image::GrayImage;
use log::debug;

/// QR decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::Decode(format!(
                "cannot decode an empty {width}x{height} frame"
            )));
        }

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                image.get_pixel(x as u32, y as u32).0[0]
            });
        let grids = prepared.detect_grids();

        let detections = grids
            .into_iter()
            .map(|grid| {
                let corners = grid
                    .bounds
                    .iter()
                    .map(|p| PixelPoint::new(p.x, p.y))
                    .collect();
                let payload = match grid.decode() {
                    Ok((_meta, content)) => Some(content),
                    Err(err) => {
                        debug!("located a QR symbol but could not decode it: {err}");
                        None
                    }
                };
                RawDetection {
                    payload,
                    symbol: QR_CODE_TYPE.to_string(),
                    corners,
                }
            })
            .collect();

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn blank_frame_has_no_detections() {
        let image = GrayImage::from_pixel(120, 80, Luma([255]));
        let detections = QrDecoder::new().decode(&image).expect("decode blank frame");
        assert!(detections.is_empty());
    }

    #[test]
    fn empty_frame_is_rejected() {
        let image = GrayImage::new(0, 0);
        let err = QrDecoder::new().decode(&image).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
    }
}
