//! Cropping to an integer pixel rectangle.

use super::types::CHANNELS;
use super::{RasterBuffer, Rect};

/// Copy the region `rect` out of `image` into a new raster.
///
/// The rectangle is clamped to the image bounds and the output is never
/// smaller than 1x1. A full-frame rect returns a clone.
pub fn crop(image: &RasterBuffer, rect: Rect) -> RasterBuffer {
    if rect.is_full_frame(image.width(), image.height()) {
        return image.clone();
    }

    let left = rect.x.min(image.width() - 1);
    let top = rect.y.min(image.height() - 1);
    let right = rect.right().min(image.width());
    let bottom = rect.bottom().min(image.height());

    let out_width = right.saturating_sub(left).max(1);
    let out_height = bottom.saturating_sub(top).max(1);

    let src = image.pixels();
    let src_stride = image.width() as usize * CHANNELS;
    let row_bytes = out_width as usize * CHANNELS;

    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    // Copy whole rows; the region is contiguous within each row
    for y in 0..out_height as usize {
        let start = (top as usize + y) * src_stride + left as usize * CHANNELS;
        output.extend_from_slice(&src[start..start + row_bytes]);
    }

    RasterBuffer::from_raw_parts(out_width, out_height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel has a unique value based on position.
    fn test_image(width: u32, height: u32) -> RasterBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        RasterBuffer::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_full_crop() {
        let img = test_image(100, 100);
        let result = crop(&img, Rect::full(100, 100));
        assert_eq!(result, img);
    }

    #[test]
    fn test_center_crop() {
        let img = test_image(10, 10);
        let result = crop(&img, Rect::new(2, 2, 6, 6));

        assert_eq!(result.dimensions(), (6, 6));
        // Value at (2, 2) = 2 * 10 + 2 = 22
        assert_eq!(result.pixel(0, 0), [22, 22, 22, 255]);
        // Value at (7, 7) = 77
        assert_eq!(result.pixel(5, 5), [77, 77, 77, 255]);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let img = test_image(10, 10);
        let result = crop(&img, Rect::new(8, 8, 5, 5));
        assert_eq!(result.dimensions(), (2, 2));
        assert_eq!(result.pixel(0, 0)[0], 88);
    }

    #[test]
    fn test_crop_origin_outside_is_clamped() {
        let img = test_image(10, 10);
        let result = crop(&img, Rect::new(50, 50, 5, 5));
        assert_eq!(result.dimensions(), (1, 1));
        assert_eq!(result.pixel(0, 0)[0], 99);
    }

    #[test]
    fn test_crop_minimum_dimension() {
        let img = test_image(10, 10);
        let result = crop(&img, Rect::new(3, 3, 0, 0));
        assert_eq!(result.dimensions(), (1, 1));
    }

    #[test]
    fn test_crop_rectangular() {
        let img = test_image(200, 100);
        let result = crop(&img, Rect::new(0, 0, 50, 100));
        assert_eq!(result.dimensions(), (50, 100));
    }

    #[test]
    fn test_crop_keeps_alpha() {
        let mut img = test_image(4, 4);
        img.put_pixel(1, 1, [9, 9, 9, 17]);
        let result = crop(&img, Rect::new(1, 1, 2, 2));
        assert_eq!(result.pixel(0, 0), [9, 9, 9, 17]);
    }
}
