use super::{Decoder, QrDecoder, RawDetection};
use crate::models::ScanRecord;
use crate::source::Frame;
use log::{debug, warn};

/// Knobs for turning detections into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvokerOptions {
    /// Keep located symbols that did not decode, as records with empty data.
    pub keep_undecoded: bool,
}

/// Calls the decode capability for each frame and stamps the results.
#[derive(Debug, Clone, Default)]
pub struct DecodeInvoker<D = QrDecoder> {
    decoder: D,
    options: InvokerOptions,
}

impl<D: Decoder> DecodeInvoker<D> {
    /// Wrap a decoder
    pub fn new(decoder: D, options: InvokerOptions) -> Self {
        Self { decoder, options }
    }

    /// Current options
    pub fn options(&self) -> InvokerOptions {
        self.options
    }

    /// Decode one frame into records.
    ///
    /// A decoder failure is logged and yields no records; the caller moves on
    /// to the next frame.
    pub fn process(&self, frame: &Frame) -> Vec<ScanRecord> {
        let gray = frame.image.to_luma8();
        let detections = match self.decoder.decode(&gray) {
            Ok(detections) => detections,
            Err(err) => {
                warn!("skipping {}: {err}", frame.label());
                return Vec::new();
            }
        };

        detections
            .into_iter()
            .filter_map(|detection| self.to_record(detection, frame))
            .collect()
    }

    fn to_record(&self, detection: RawDetection, frame: &Frame) -> Option<ScanRecord> {
        let data = match detection.payload {
            Some(data) => data,
            None if self.options.keep_undecoded => String::new(),
            None => {
                debug!("dropping undecoded symbol in {}", frame.label());
                return None;
            }
        };
        if detection.corners.len() < 3 {
            warn!(
                "dropping detection with {} corner(s) in {}",
                detection.corners.len(),
                frame.label()
            );
            return None;
        }

        let polygon = detection
            .corners
            .iter()
            .map(|&p| frame.to_source_coords(p))
            .collect();
        let record = ScanRecord::new(data, detection.symbol, polygon, frame.source);
        Some(match &frame.path {
            Some(path) => record.with_path(path.clone()),
            None => record,
        })
    }
}
