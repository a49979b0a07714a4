//! Test fixtures shared across modules.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// An RGBA image whose pixels all differ, with non-opaque alpha.
pub(crate) fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgba8(img)
}

/// Encode `img` in `format`, converting to a color type the encoder accepts.
pub(crate) fn encode_as(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let prepared = match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img.clone(),
    };
    let mut out = Vec::new();
    prepared
        .write_to(&mut Cursor::new(&mut out), format)
        .unwrap();
    out
}

/// Write a PNG of the given size to `path`, creating parent directories.
pub(crate) fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, encode_as(&gradient_rgba(width, height), ImageFormat::Png)).unwrap();
}
