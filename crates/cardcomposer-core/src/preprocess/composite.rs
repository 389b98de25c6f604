//! Floating-point source-over compositing of offset copies.
//!
//! Both the background-normalization blur and the unsharp-mask blur are built
//! by drawing shifted, partially transparent copies of a raster onto a layer.
//! The layer keeps premultiplied color in `f32` so repeated passes do not
//! accumulate 8-bit rounding.

use crate::raster::{RasterBuffer, CHANNELS};

/// An RGBA working layer with premultiplied color in 0.0..=255.0 and alpha in 0.0..=1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatLayer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FloatLayer {
    /// A fully transparent layer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Copy a straight-alpha raster into a premultiplied layer.
    pub fn from_raster(image: &RasterBuffer) -> Self {
        let data = image
            .pixels()
            .chunks_exact(CHANNELS)
            .flat_map(|px| {
                let a = px[3] as f32 / 255.0;
                [px[0] as f32 * a, px[1] as f32 * a, px[2] as f32 * a, a]
            })
            .collect();

        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Straight (un-premultiplied) RGB and alpha at `(x, y)`.
    ///
    /// Fully transparent pixels report black.
    #[inline]
    pub fn straight_at(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let a = self.data[idx + 3];
        if a <= 0.0 {
            return [0.0; 4];
        }
        [
            self.data[idx] / a,
            self.data[idx + 1] / a,
            self.data[idx + 2] / a,
            a,
        ]
    }

    /// Draw `source` shifted by `(dx, dy)` with the given opacity, source-over.
    ///
    /// Pixels of `source` that land outside this layer are dropped.
    pub fn draw(&mut self, source: &FloatLayer, dx: i32, dy: i32, opacity: f32) {
        let w = self.width.min(source.width) as i64;
        let h = self.height.min(source.height) as i64;
        let (dx, dy) = (dx as i64, dy as i64);

        let y_start = dy.max(0);
        let y_end = (h + dy).min(self.height as i64);
        let x_start = dx.max(0);
        let x_end = (w + dx).min(self.width as i64);

        for y in y_start..y_end {
            let sy = (y - dy) as usize;
            for x in x_start..x_end {
                let sx = (x - dx) as usize;
                let s = (sy * source.width as usize + sx) * CHANNELS;
                let d = (y as usize * self.width as usize + x as usize) * CHANNELS;

                let src_a = source.data[s + 3] * opacity;
                if src_a <= 0.0 {
                    continue;
                }
                let keep = 1.0 - src_a;
                for c in 0..3 {
                    self.data[d + c] = source.data[s + c] * opacity + self.data[d + c] * keep;
                }
                self.data[d + 3] = src_a + self.data[d + 3] * keep;
            }
        }
    }
}

/// Repeatedly draw a snapshot of the layer onto itself.
///
/// Each pass draws the layer as it was before that pass, shifted by the
/// pass's offset, at `opacity`.
pub fn self_composite(image: &RasterBuffer, offsets: &[(i32, i32)], opacity: f32) -> FloatLayer {
    let mut layer = FloatLayer::from_raster(image);
    for &(dx, dy) in offsets {
        let snapshot = layer.clone();
        layer.draw(&snapshot, dx, dy, opacity);
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_image_is_fixed_point() {
        let img = RasterBuffer::filled(12, 12, [90, 140, 200, 255]).unwrap();
        let layer = self_composite(&img, &[(-6, -6), (0, -6), (6, -6)], 0.5);

        for y in 0..12 {
            for x in 0..12 {
                let [r, g, b, a] = layer.straight_at(x, y);
                assert!((r - 90.0).abs() < 1e-3);
                assert!((g - 140.0).abs() < 1e-3);
                assert!((b - 200.0).abs() < 1e-3);
                assert!((a - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_draw_onto_transparent_accumulates_alpha() {
        let img = RasterBuffer::filled(4, 4, [100, 100, 100, 255]).unwrap();
        let src = FloatLayer::from_raster(&img);
        let mut layer = FloatLayer::transparent(4, 4);

        layer.draw(&src, 0, 0, 0.25);
        assert!((layer.straight_at(1, 1)[3] - 0.25).abs() < 1e-6);

        layer.draw(&src, 0, 0, 0.25);
        // 0.25 + 0.25 * 0.75
        assert!((layer.straight_at(1, 1)[3] - 0.4375).abs() < 1e-6);
        // Color stays the same once un-premultiplied
        assert!((layer.straight_at(1, 1)[0] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_draw_offset_leaves_uncovered_pixels() {
        let img = RasterBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap();
        let src = FloatLayer::from_raster(&img);
        let mut layer = FloatLayer::transparent(4, 4);

        layer.draw(&src, 2, 0, 1.0);
        assert_eq!(layer.straight_at(0, 0), [0.0; 4]);
        assert_eq!(layer.straight_at(1, 3), [0.0; 4]);
        assert!((layer.straight_at(2, 0)[0] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_draw_shifts_content() {
        let mut img = RasterBuffer::filled(5, 1, [0, 0, 0, 255]).unwrap();
        img.put_pixel(1, 0, [200, 200, 200, 255]);
        let src = FloatLayer::from_raster(&img);
        let mut layer = FloatLayer::transparent(5, 1);

        layer.draw(&src, 2, 0, 1.0);
        assert!((layer.straight_at(3, 0)[0] - 200.0).abs() < 1e-3);
        assert!(layer.straight_at(1, 0)[0].abs() < 1e-3);
    }

    #[test]
    fn test_negative_offset() {
        let mut img = RasterBuffer::filled(3, 3, [0, 0, 0, 255]).unwrap();
        img.put_pixel(2, 2, [50, 60, 70, 255]);
        let src = FloatLayer::from_raster(&img);
        let mut layer = FloatLayer::transparent(3, 3);

        layer.draw(&src, -2, -2, 1.0);
        let [r, g, b, a] = layer.straight_at(0, 0);
        assert!((r - 50.0).abs() < 1e-3 && (g - 60.0).abs() < 1e-3 && (b - 70.0).abs() < 1e-3);
        assert!((a - 1.0).abs() < 1e-6);
        assert_eq!(layer.straight_at(2, 2), [0.0; 4]);
    }
}
