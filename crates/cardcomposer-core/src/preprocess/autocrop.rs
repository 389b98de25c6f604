//! Content-based auto-crop.
//!
//! The background luminance is estimated as the median of samples taken
//! along all four borders; every pixel on a stride-2 grid whose luminance
//! differs from it by more than the threshold counts as content.

use crate::luminance::luminance_at;
use crate::raster::{RasterBuffer, Rect};

/// Minimum luminance difference from the background that counts as content.
pub const CONTENT_THRESHOLD: f32 = 16.0;

/// Padding added around the detected content on every side.
pub const CROP_PADDING: u32 = 18;

/// Number of samples taken along each edge.
pub const EDGE_SAMPLES: u32 = 50;

/// Step between scanned pixels in both directions.
pub const SCAN_STRIDE: usize = 2;

/// Median border luminance.
///
/// Samples `EDGE_SAMPLES` evenly spaced points on the top, bottom, left and
/// right edges and returns the upper median of all of them.
pub fn estimate_background_luminance(image: &RasterBuffer) -> f32 {
    let (w, h) = image.dimensions();
    let mut samples = Vec::with_capacity(EDGE_SAMPLES as usize * 4);

    for i in 0..EDGE_SAMPLES {
        let t = i as f64 / (EDGE_SAMPLES - 1) as f64;
        let px = (t * (w - 1) as f64).floor() as u32;
        samples.push(luminance_at(image, px, 0));
        samples.push(luminance_at(image, px, h - 1));

        let py = (t * (h - 1) as f64).floor() as u32;
        samples.push(luminance_at(image, 0, py));
        samples.push(luminance_at(image, w - 1, py));
    }

    samples.sort_by(|a, b| a.total_cmp(b));
    samples[samples.len() / 2]
}

/// Find the padded bounding rect of everything that differs from the background.
///
/// Returns the full frame when the detected content does not span at least
/// two scan positions in both directions. The result is never zero-area.
pub fn detect_content_rect(image: &RasterBuffer) -> Rect {
    let (w, h) = image.dimensions();
    let background = estimate_background_luminance(image);

    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for y in (0..h).step_by(SCAN_STRIDE) {
        for x in (0..w).step_by(SCAN_STRIDE) {
            if (luminance_at(image, x, y) - background).abs() > CONTENT_THRESHOLD {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if max_x <= min_x || max_y <= min_y {
        return Rect::full(w, h);
    }

    let left = min_x.saturating_sub(CROP_PADDING);
    let top = min_y.saturating_sub(CROP_PADDING);
    let right = (max_x + CROP_PADDING).min(w - 1);
    let bottom = (max_y + CROP_PADDING).min(h - 1);

    Rect::new(left, top, right - left + 1, bottom - top + 1)
}
