//! Built-in placeholder frame, available before the user loads one.

use super::blend::{fill_rect, stroke_rect};
use crate::raster::{RasterBuffer, RasterError, CHANNELS};

pub const DEMO_FRAME_WIDTH: u32 = 900;
pub const DEMO_FRAME_HEIGHT: u32 = 1200;

const GRADIENT_TOP: [u8; 3] = [0x16, 0x20, 0x33];
const GRADIENT_BOTTOM: [u8; 3] = [0x0b, 0x0f, 0x14];
const OUTER_BORDER: [u8; 4] = [0xd9, 0xe7, 0xff, 255];
const INNER_BORDER: [u8; 4] = [0x2b, 0x3a, 0x52, 255];
// rgba(232, 238, 247, 0.9)
const TITLE_PLATE: [u8; 4] = [232, 238, 247, 230];

/// Render the demo frame: a dark vertical gradient, two borders and a title plate.
pub fn demo_frame() -> Result<RasterBuffer, RasterError> {
    let (w, h) = (DEMO_FRAME_WIDTH, DEMO_FRAME_HEIGHT);
    let mut frame = vertical_gradient(w, h, GRADIENT_TOP, GRADIENT_BOTTOM)?;
    let (w, h) = (w as i64, h as i64);

    stroke_rect(&mut frame, 30, 30, w - 60, h - 60, 14, OUTER_BORDER);
    stroke_rect(&mut frame, 55, 55, w - 110, h - 110, 6, INNER_BORDER);
    fill_rect(&mut frame, 80, 80, w - 80, 80 + 90, TITLE_PLATE);

    Ok(frame)
}

/// Opaque gradient from `top` at y = 0 to `bottom` at y = height, sampled at pixel centers.
fn vertical_gradient(
    width: u32,
    height: u32,
    top: [u8; 3],
    bottom: [u8; 3],
) -> Result<RasterBuffer, RasterError> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
    for y in 0..height {
        let t = (y as f32 + 0.5) / height as f32;
        let mut row = [255u8; 4];
        for c in 0..3 {
            let v = top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t;
            row[c] = v.round() as u8;
        }
        for _ in 0..width {
            pixels.extend_from_slice(&row);
        }
    }
    RasterBuffer::new(width, height, pixels)
}
