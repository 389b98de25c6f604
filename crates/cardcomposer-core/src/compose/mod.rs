//! Compositing of frame and cutout into the output canvas
//!
//! ## Layer Order
//! 1. Solid background (`#0b0f14`)
//! 2. Frame stretched to the canvas, or the placeholder panel (`#111a27`)
//! 3. Cutout, placed by the current [`AffineState`]
//!
//! The cutout is drawn by inverse-mapping every canvas pixel inside its
//! bounding box back into cutout space and sampling bilinearly.

mod blend;
mod demo;

pub use blend::{blend_over, draw_over, fill_rect, premultiply, sample_bilinear, stroke_rect};
pub use demo::{demo_frame, DEMO_FRAME_HEIGHT, DEMO_FRAME_WIDTH};

use tracing::instrument;

use crate::geometry::AffineState;
use crate::raster::{resize, FilterType, RasterBuffer, RasterError, CHANNELS};
use crate::CanvasSize;

/// Canvas background color (`#0b0f14`).
pub const BACKGROUND: [u8; 4] = [0x0b, 0x0f, 0x14, 255];

/// Panel shown in place of a missing frame (`#111a27`).
pub const PLACEHOLDER: [u8; 4] = [0x11, 0x1a, 0x27, 255];

/// Render the composite.
///
/// # Arguments
/// * `frame` - Frame image, stretched non-uniformly over the whole canvas
/// * `cutout` - Character cutout, drawn with `state`
/// * `state` - Placement of the cutout center
/// * `canvas` - Output size
///
/// # Returns
/// A new opaque raster of exactly `canvas` size.
#[instrument(skip_all, fields(width = canvas.width, height = canvas.height))]
pub fn render(
    frame: Option<&RasterBuffer>,
    cutout: Option<&RasterBuffer>,
    state: &AffineState,
    canvas: CanvasSize,
) -> Result<RasterBuffer, RasterError> {
    let mut output = RasterBuffer::filled(canvas.width, canvas.height, BACKGROUND)?;

    match frame {
        Some(frame) => {
            let stretched = resize(frame, canvas.width, canvas.height, FilterType::Bilinear)?;
            draw_over(&mut output, &stretched, 0, 0);
        }
        None => fill_rect(
            &mut output,
            0,
            0,
            canvas.width as i64,
            canvas.height as i64,
            PLACEHOLDER,
        ),
    }

    if let Some(cutout) = cutout {
        draw_transformed(&mut output, cutout, state);
    }

    Ok(output)
}

/// Draw `image` onto `dst` through the affine placement `state`.
fn draw_transformed(dst: &mut RasterBuffer, image: &RasterBuffer, state: &AffineState) {
    let (iw, ih) = image.dimensions();
    let (min_x, min_y, max_x, max_y) = state.canvas_bounds(iw, ih);
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return;
    }

    let width = dst.width() as i64;
    let height = dst.height() as i64;
    let x_start = (min_x.floor() as i64 - 1).clamp(0, width);
    let x_end = (max_x.ceil() as i64 + 1).clamp(0, width);
    let y_start = (min_y.floor() as i64 - 1).clamp(0, height);
    let y_end = (max_y.ceil() as i64 + 1).clamp(0, height);

    let stride = dst.width() as usize;
    let pixels = dst.pixels_mut();

    for y in y_start..y_end {
        for x in x_start..x_end {
            let Some((u, v)) = state.canvas_to_cutout(x as f64 + 0.5, y as f64 + 0.5, iw, ih)
            else {
                return;
            };
            let src = sample_bilinear(image, u, v);
            let idx = (y as usize * stride + x as usize) * CHANNELS;
            blend_over(&mut pixels[idx..idx + CHANNELS], src);
        }
    }
}

/// Fit `image` inside a `box_width x box_height` preview, letterboxed over the background.
///
/// The image is scaled by `min(box_w / w, box_h / h)` (up or down) and centered.
pub fn render_contain(
    image: &RasterBuffer,
    box_width: u32,
    box_height: u32,
) -> Result<RasterBuffer, RasterError> {
    let mut output = RasterBuffer::filled(box_width, box_height, BACKGROUND)?;

    let scale = (box_width as f64 / image.width() as f64)
        .min(box_height as f64 / image.height() as f64);
    let dw = ((image.width() as f64 * scale).round() as u32).clamp(1, box_width);
    let dh = ((image.height() as f64 * scale).round() as u32).clamp(1, box_height);

    let scaled = resize(image, dw, dh, FilterType::Bilinear)?;
    let dx = (box_width - dw) as i64 / 2;
    let dy = (box_height - dh) as i64 / 2;
    draw_over(&mut output, &scaled, dx, dy);

    Ok(output)
}
