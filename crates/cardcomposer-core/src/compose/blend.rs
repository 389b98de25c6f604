//! Pixel-level drawing primitives: source-over blending, rectangles and
//! bilinear sampling.

use crate::raster::{RasterBuffer, CHANNELS};

/// Blend one premultiplied source pixel over a straight-alpha destination pixel.
///
/// `src` holds premultiplied color in 0.0..=255.0 and alpha in 0.0..=1.0.
#[inline]
pub fn blend_over(dst: &mut [u8], src: [f32; 4]) {
    let src_a = src[3];
    if src_a <= 0.0 {
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let keep = dst_a * (1.0 - src_a);
    let out_a = src_a + keep;

    for c in 0..3 {
        let premult = src[c] + dst[c] as f32 * keep;
        dst[c] = (premult / out_a).clamp(0.0, 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
}

/// Premultiply a straight-alpha color, with an extra opacity factor.
#[inline]
pub fn premultiply(rgba: [u8; 4], opacity: f32) -> [f32; 4] {
    let a = rgba[3] as f32 / 255.0 * opacity;
    [rgba[0] as f32 * a, rgba[1] as f32 * a, rgba[2] as f32 * a, a]
}

/// Draw `src` over `dst` with its top-left corner at `(x, y)`; parts outside are clipped.
pub fn draw_over(dst: &mut RasterBuffer, src: &RasterBuffer, x: i64, y: i64) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);

    for sy in 0..src.height() as i64 {
        let ty = y + sy;
        if ty < 0 || ty >= dh {
            continue;
        }
        for sx in 0..src.width() as i64 {
            let tx = x + sx;
            if tx < 0 || tx >= dw {
                continue;
            }
            let rgba = src.pixel(sx as u32, sy as u32);
            let idx = (ty as usize * dw as usize + tx as usize) * CHANNELS;
            blend_over(&mut dst.pixels_mut()[idx..idx + CHANNELS], premultiply(rgba, 1.0));
        }
    }
}

/// Fill the half-open rectangle `[x0, x1) x [y0, y1)` with `rgba`, blending over.
pub fn fill_rect(dst: &mut RasterBuffer, x0: i64, y0: i64, x1: i64, y1: i64, rgba: [u8; 4]) {
    let x0 = x0.clamp(0, dst.width() as i64) as usize;
    let x1 = x1.clamp(0, dst.width() as i64) as usize;
    let y0 = y0.clamp(0, dst.height() as i64) as usize;
    let y1 = y1.clamp(0, dst.height() as i64) as usize;
    let width = dst.width() as usize;
    let src = premultiply(rgba, 1.0);

    let pixels = dst.pixels_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let idx = (y * width + x) * CHANNELS;
            blend_over(&mut pixels[idx..idx + CHANNELS], src);
        }
    }
}

/// Stroke the outline of a rectangle with a line centered on its edges.
pub fn stroke_rect(
    dst: &mut RasterBuffer,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    line_width: i64,
    rgba: [u8; 4],
) {
    let half = line_width / 2;
    let (left, top) = (x - half, y - half);
    let (right, bottom) = (x + width + half, y + height + half);
    let (inner_left, inner_top) = (x + half, y + half);
    let (inner_right, inner_bottom) = (x + width - half, y + height - half);

    fill_rect(dst, left, top, right, inner_top, rgba);
    fill_rect(dst, left, inner_bottom, right, bottom, rgba);
    fill_rect(dst, left, inner_top, inner_left, inner_bottom, rgba);
    fill_rect(dst, inner_right, inner_top, right, inner_bottom, rgba);
}

/// Premultiplied pixel, transparent outside the raster.
#[inline]
fn premultiplied_at(image: &RasterBuffer, x: i64, y: i64) -> [f32; 4] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return [0.0; 4];
    }
    premultiply(image.pixel(x as u32, y as u32), 1.0)
}

/// Bilinear sample at a continuous position, with pixel centers at `i + 0.5`.
///
/// Interpolation happens on premultiplied values so transparent texels do
/// not bleed their color; positions off the raster fade to transparent.
pub fn sample_bilinear(image: &RasterBuffer, x: f64, y: f64) -> [f32; 4] {
    let sx = x - 0.5;
    let sy = y - 0.5;

    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Fractional distances
    let fx = (sx - x0 as f64) as f32;
    let fy = (sy - y0 as f64) as f32;

    let p00 = premultiplied_at(image, x0, y0);
    let p10 = premultiplied_at(image, x1, y0);
    let p01 = premultiplied_at(image, x0, y1);
    let p11 = premultiplied_at(image, x1, y1);

    let mut result = [0.0f32; 4];
    for i in 0..4 {
        result[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }

    result
}
