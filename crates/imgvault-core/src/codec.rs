//! ImageCodec - 画像の正規化と圧縮
//!
//! # フロー
//! - encode: 任意のラスタ画像 → RGB に変換 → PNG（可逆）→ zlib 圧縮
//! - decode: zlib 展開 → PNG デコード
//!
//! チャネルあたり 8 bit の入力は RGB8、16 bit の入力は RGB16 に変換します。
//! 変換で落ちるのはアルファチャネルだけで、画素値は PNG と zlib が
//! どちらも可逆なので変化しません。
//! 浮動小数点の入力（32F）は PNG で表現できないため RGB16 に量子化されます。

use std::io::{Cursor, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat};

use crate::domain::CodecError;

/// Format every image is normalized to before compression.
pub const CANONICAL_FORMAT: ImageFormat = ImageFormat::Png;

/// Codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// zlib level, 0 (store) to 9 (best).
    pub level: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        // zlib の既定レベル
        Self { level: 6 }
    }
}

/// Pure in-memory transcoder. Cheap to copy into blocking tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    config: CodecConfig,
}

impl ImageCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config: CodecConfig {
                level: config.level.min(9),
            },
        }
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Normalize `raw` to an RGB PNG (8 or 16 bit per channel) and zlib-compress it.
    ///
    /// # Errors
    /// `UnsupportedInput` if `raw` is not a decodable image.
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let decoded = image::load_from_memory(raw)
            .map_err(|e| CodecError::UnsupportedInput(e.to_string()))?;
        let canonical = canonical_raster(&decoded);

        let mut png = Vec::new();
        canonical
            .write_to(&mut Cursor::new(&mut png), CANONICAL_FORMAT)
            .map_err(|e| CodecError::UnsupportedInput(format!("png encode: {e}")))?;

        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(png.len() / 2),
            Compression::new(self.config.level),
        );
        encoder.write_all(&png).map_err(zlib_error)?;
        encoder.finish().map_err(zlib_error)
    }

    /// Inverse of [`encode`](Self::encode).
    ///
    /// # Errors
    /// `CorruptPayload` if the bytes are empty, fail to inflate, or do not
    /// inflate to a valid PNG.
    pub fn decode(&self, payload: &[u8]) -> Result<DynamicImage, CodecError> {
        if payload.is_empty() {
            return Err(CodecError::CorruptPayload("empty payload".to_string()));
        }

        let mut png = Vec::new();
        ZlibDecoder::new(payload)
            .read_to_end(&mut png)
            .map_err(|e| CodecError::CorruptPayload(format!("zlib: {e}")))?;

        image::load_from_memory_with_format(&png, CANONICAL_FORMAT)
            .map_err(|e| CodecError::CorruptPayload(format!("png decode: {e}")))
    }
}

/// RGB at the source's bit depth; PNG has no float samples, so 32F goes to 16 bit.
fn canonical_raster(decoded: &DynamicImage) -> DynamicImage {
    match decoded {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageRgb32F(_)
        | DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgb16(decoded.to_rgb16()),
        _ => DynamicImage::ImageRgb8(decoded.to_rgb8()),
    }
}

fn zlib_error(e: std::io::Error) -> CodecError {
    CodecError::UnsupportedInput(format!("zlib: {e}"))
}
