//! Raster codec helpers: decode inputs to RGB, encode corrected frames

use crate::document::RasterFormat;
use crate::error::DeskewError;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Default JPEG quality for corrected JPEG outputs
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Decode an image file into 8-bit RGB, whatever its stored color mode.
/// The format is sniffed from the content, not trusted from the extension.
pub fn decode_raster(path: &Path) -> Result<RgbImage, DeskewError> {
    let reader = ImageReader::open(path)
        .map_err(|e| DeskewError::ReadError(format!("Failed to open image: {}", e)))?
        .with_guessed_format()
        .map_err(|e| DeskewError::ReadError(format!("Failed to read image: {}", e)))?;

    let img = reader
        .decode()
        .map_err(|e| DeskewError::ReadError(format!("Failed to decode image: {}", e)))?;

    Ok(img.into_rgb8())
}

/// Decode PNG bytes produced by [`encode_png`]
pub fn decode_png(bytes: &[u8]) -> Result<RgbImage, DeskewError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|img| img.into_rgb8())
        .map_err(|e| DeskewError::EncodeError(format!("Failed to decode page image: {}", e)))
}

/// Encode a frame as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, DeskewError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| DeskewError::EncodeError(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer)
}

/// Encode a frame in the given raster format
pub fn encode(image: &RgbImage, format: RasterFormat, jpeg_quality: u8) -> Result<Vec<u8>, DeskewError> {
    match format {
        RasterFormat::Png => encode_png(image),
        RasterFormat::Jpeg => {
            let mut buffer = Vec::new();
            JpegEncoder::new_with_quality(&mut buffer, jpeg_quality)
                .encode_image(image)
                .map_err(|e| DeskewError::EncodeError(format!("Failed to encode JPEG: {}", e)))?;
            Ok(buffer)
        }
    }
}
