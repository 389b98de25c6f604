//! Background (lighting gradient) normalization.
//!
//! A low-frequency estimate of the lighting is built by compositing six
//! offset copies of the image onto itself at half opacity. Subtracting that
//! estimate and re-centering on mid-gray flattens uneven lighting before the
//! tone stage.

use super::composite::self_composite;
use crate::raster::{RasterBuffer, CHANNELS};

/// Offset step in pixels between the blur passes.
pub const BLUR_STEP: i32 = 6;

/// Opacity of every blur pass.
pub const BLUR_OPACITY: f32 = 0.5;

/// Offsets of the six blur passes, in draw order.
///
/// `((i % 3) - 1) * 6, (i / 3 - 1) * 6` for `i` in `0..6`.
pub fn blur_offsets() -> [(i32, i32); 6] {
    let mut offsets = [(0, 0); 6];
    for (i, offset) in offsets.iter_mut().enumerate() {
        let i = i as i32;
        *offset = (((i % 3) - 1) * BLUR_STEP, (i / 3 - 1) * BLUR_STEP);
    }
    offsets
}

/// Subtract the blurred lighting field from every color channel.
///
/// `out = clamp(in - (blurred - 128), 0, 255)`. Alpha is carried through.
pub fn normalize_background(image: &RasterBuffer) -> RasterBuffer {
    let blurred = self_composite(image, &blur_offsets(), BLUR_OPACITY);
    let mut output = image.clone();
    let width = image.width();

    for (i, chunk) in output.pixels_mut().chunks_exact_mut(CHANNELS).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let bg = blurred.straight_at(x, y);

        for c in 0..3 {
            let v = chunk[c] as f32 - (bg[c] - 128.0);
            chunk[c] = v.clamp(0.0, 255.0).round() as u8;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_offsets_order() {
        assert_eq!(
            blur_offsets(),
            [(-6, -6), (0, -6), (6, -6), (-6, 0), (0, 0), (6, 0)]
        );
    }

    #[test]
    fn test_uniform_image_maps_to_mid_gray() {
        let img = RasterBuffer::filled(20, 20, [200, 40, 128, 255]).unwrap();
        let result = normalize_background(&img);

        for chunk in result.pixels().chunks_exact(4) {
            assert_eq!(chunk, &[128, 128, 128, 255]);
        }
    }

    #[test]
    fn test_alpha_is_carried_through() {
        let img = RasterBuffer::filled(8, 8, [60, 60, 60, 99]).unwrap();
        let result = normalize_background(&img);
        assert!(result.pixels().chunks_exact(4).all(|p| p[3] == 99));
    }

    #[test]
    fn test_lighting_gradient_is_flattened() {
        // Horizontal gradient from 40 to 230; after normalization the spread shrinks
        let width = 64u32;
        let mut pixels = Vec::new();
        for _y in 0..32 {
            for x in 0..width {
                let v = (40 + x * 190 / (width - 1)) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let img = RasterBuffer::new(width, 32, pixels).unwrap();
        let result = normalize_background(&img);

        let spread = |r: &RasterBuffer| {
            let row: Vec<u8> = (10..54).map(|x| r.pixel(x, 16)[0]).collect();
            row.iter().max().unwrap() - row.iter().min().unwrap()
        };
        assert!(spread(&result) < spread(&img));
    }

    #[test]
    fn test_dimensions_preserved() {
        let img = RasterBuffer::filled(13, 7, [10, 20, 30, 255]).unwrap();
        assert_eq!(normalize_background(&img).dimensions(), (13, 7));
    }
}
