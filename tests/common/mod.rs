//! Shared fixtures: QR codes rendered at test time.

#![allow(dead_code)]

use image::{GrayImage, Luma, RgbImage};
use qrcode::{Color, QrCode};
use std::path::{Path, PathBuf};

/// Modules of white border around the symbol.
const QUIET_ZONE: u32 = 4;

/// Render `data` as a QR code, `scale` pixels per module, on a white border.
pub fn qr_image(data: &str, scale: u32) -> GrayImage {
    let code = QrCode::new(data.as_bytes()).expect("encode QR fixture");
    let width = code.width() as u32;
    let colors = code.to_colors();
    let side = (width + 2 * QUIET_ZONE) * scale;
    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / scale, y / scale);
        let inside = (QUIET_ZONE..QUIET_ZONE + width).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + width).contains(&my);
        if !inside {
            return Luma([255]);
        }
        let index = ((my - QUIET_ZONE) * width + (mx - QUIET_ZONE)) as usize;
        match colors[index] {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    })
}

/// Same fixture as an RGB frame, the way a camera delivers it.
pub fn qr_frame(data: &str, scale: u32) -> RgbImage {
    image::DynamicImage::ImageLuma8(qr_image(data, scale)).to_rgb8()
}

/// Write a QR fixture to `dir/name`, creating parent directories.
pub fn write_qr(dir: &Path, name: &str, data: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dirs");
    }
    qr_image(data, 8).save(&path).expect("save QR fixture");
    path
}

/// Write a plain white image to `dir/name`.
pub fn write_blank(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(120, 120, Luma([255]))
        .save(&path)
        .expect("save blank fixture");
    path
}
