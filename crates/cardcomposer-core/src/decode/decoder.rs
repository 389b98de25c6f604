//! JPEG/PNG decoding into an upright RGBA raster.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use tracing::debug;

use super::{get_orientation, DecodeError};
use crate::raster::RasterBuffer;

/// Decode JPEG or PNG bytes, applying EXIF orientation.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes
///
/// # Returns
///
/// An RGBA `RasterBuffer`; images without alpha come back fully opaque.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are neither JPEG nor PNG.
/// Returns `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_image(bytes: &[u8]) -> Result<RasterBuffer, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        _ => return Err(DecodeError::InvalidFormat),
    }

    let orientation = get_orientation(bytes);
    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    debug!(?orientation, width = img.width(), height = img.height(), "decoded");

    let rgba = orientation.apply(img).into_rgba8();
    RasterBuffer::from_rgba_image(rgba).map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}
