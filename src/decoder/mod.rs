//! Decode capability and the invoker that turns its output into records.
//!
//! The actual symbol location and decoding is delegated to a [`Decoder`]
//! implementation. [`QrDecoder`] is the bundled one, backed by `rqrr`.

use crate::error::Result;
use crate::models::PixelPoint;
use image::GrayImage;
use std::sync::Arc;

/// Invokes a decoder per frame and builds records
pub mod invoker;
/// `rqrr`-backed QR decoder
pub mod qr;

pub use invoker::{DecodeInvoker, InvokerOptions};
pub use qr::QrDecoder;

/// What the decode capability reports for one located symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    /// Decoded text, `None` when the symbol was located but not readable
    pub payload: Option<String>,
    /// Symbol type tag
    pub symbol: String,
    /// Outline corners in the coordinates of the image passed to `decode`
    pub corners: Vec<PixelPoint>,
}

/// External decode capability: image in, detections out.
pub trait Decoder: Send + Sync {
    /// Locate and decode every symbol in `image`.
    ///
    /// An image without symbols is `Ok(vec![])`. `Err` means the image itself
    /// could not be processed.
    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>>;
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>> {
        (**self).decode(image)
    }
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>> {
        (**self).decode(image)
    }
}
