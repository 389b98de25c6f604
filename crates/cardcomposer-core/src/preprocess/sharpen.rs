//! Unsharp mask built from four offset draws.

use super::composite::FloatLayer;
use crate::raster::{RasterBuffer, CHANNELS};

/// Amounts at or below this are treated as "sharpening off".
pub const MIN_SHARPEN_AMOUNT: f32 = 0.001;

/// Multiplier applied to the configured amount.
pub const SHARPEN_GAIN: f32 = 1.8;

/// Opacity of each blur draw.
const BLUR_OPACITY: f32 = 0.25;

/// Offsets of the four blur draws, in draw order.
const BLUR_OFFSETS: [(i32, i32); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];

/// Sharpen an image by amplifying its difference from a blurred copy.
///
/// The blurred copy is the image drawn four times onto a transparent layer;
/// its straight color is compared with the input per channel:
/// `out = clamp(in + (in - blurred) * amount * 1.8, 0, 255)`.
/// Alpha is carried through.
pub fn unsharp_mask(image: &RasterBuffer, amount: f32) -> RasterBuffer {
    if amount <= MIN_SHARPEN_AMOUNT {
        return image.clone();
    }

    let source = FloatLayer::from_raster(image);
    let mut blurred = FloatLayer::transparent(image.width(), image.height());
    for &(dx, dy) in &BLUR_OFFSETS {
        blurred.draw(&source, dx, dy, BLUR_OPACITY);
    }

    let gain = amount * SHARPEN_GAIN;
    let width = image.width() as usize;
    let mut output = image.clone();

    for (i, chunk) in output.pixels_mut().chunks_exact_mut(CHANNELS).enumerate() {
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        let blur = blurred.straight_at(x, y);

        for c in 0..3 {
            let v = chunk[c] as f32;
            chunk[c] = (v + (v - blur[c]) * gain).clamp(0.0, 255.0).round() as u8;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_is_noop() {
        let mut img = RasterBuffer::filled(5, 5, [10, 20, 30, 255]).unwrap();
        img.put_pixel(2, 2, [250, 250, 250, 255]);
        assert_eq!(unsharp_mask(&img, 0.0), img);
        assert_eq!(unsharp_mask(&img, 0.0005), img);
    }

    #[test]
    fn test_flat_image_unchanged() {
        let img = RasterBuffer::filled(9, 9, [120, 130, 140, 255]).unwrap();
        assert_eq!(unsharp_mask(&img, 1.0), img);
    }

    #[test]
    fn test_bright_spot_is_amplified() {
        let mut img = RasterBuffer::filled(9, 9, [100, 100, 100, 255]).unwrap();
        img.put_pixel(4, 4, [150, 150, 150, 255]);

        let result = unsharp_mask(&img, 0.5);
        assert!(result.pixel(4, 4)[0] > 150);
        // Its neighbours are pushed away from the spot
        assert!(result.pixel(6, 4)[0] < 100);
    }

    #[test]
    fn test_alpha_preserved() {
        let mut img = RasterBuffer::filled(6, 6, [100, 100, 100, 200]).unwrap();
        img.put_pixel(3, 3, [0, 0, 0, 200]);
        let result = unsharp_mask(&img, 1.0);
        assert!(result.pixels().chunks_exact(4).all(|p| p[3] == 200));
    }
}
