/// Pixel coordinates and bounding rectangles
pub mod point;
/// Scan result records
pub mod record;

pub use point::{BoundingRect, PixelPoint};
pub use record::{QR_CODE_TYPE, ScanRecord, SourceKind};
