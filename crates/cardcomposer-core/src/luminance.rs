//! Luminance calculation using ITU-R BT.709 coefficients.
//!
//! Auto-crop compares every sampled pixel against a background luminance
//! estimate, so these functions work directly on 8-bit RGBA rasters and keep
//! the result unrounded.

use crate::raster::RasterBuffer;

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.0722;

/// Luminance of an 8-bit RGB triple, in the 0.0 to 255.0 range.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32
}

/// Luminance of the pixel at `(x, y)`. Alpha is ignored.
#[inline]
pub fn luminance_at(image: &RasterBuffer, x: u32, y: u32) -> f32 {
    let [r, g, b, _] = image.pixel(x, y);
    luminance(r, g, b)
}
