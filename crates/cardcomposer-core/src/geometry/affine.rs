//! Placement of the cutout on the composite canvas.

use serde::{Deserialize, Serialize};

use crate::CanvasSize;

/// Smallest scale reachable by gestures or fit-to-frame.
pub const MIN_SCALE: f64 = 0.05;

/// Largest scale reachable by gestures.
pub const MAX_SCALE: f64 = 30.0;

/// Margin kept free on every side by fit-to-frame.
pub const FIT_MARGIN: f64 = 120.0;

/// Vertical offset of the fitted cutout below the canvas center.
pub const FIT_VERTICAL_OFFSET: f64 = 40.0;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle of the vector from `self` to `other`, in radians.
    pub fn angle_to(&self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Where the cutout's center sits and how it is oriented.
///
/// Applied as `translate(tx, ty) -> rotate(rotation) -> scale(scale * flip, scale)
/// -> translate(-w/2, -h/2)`, so every operation pivots on the cutout center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineState {
    pub tx: f64,
    pub ty: f64,
    pub scale: f64,
    /// Rotation in radians, clockwise in canvas space (y points down).
    pub rotation: f64,
    pub flip_x: bool,
}

impl AffineState {
    /// Unscaled, unrotated, unflipped and centered on the canvas.
    pub fn centered(canvas: CanvasSize) -> Self {
        let (tx, ty) = canvas.center();
        Self {
            tx,
            ty,
            scale: 1.0,
            rotation: 0.0,
            flip_x: false,
        }
    }

    /// Scale the cutout to fill the canvas minus its margins.
    ///
    /// Resets rotation and places the center slightly below the canvas
    /// midpoint. Flip is left as it is.
    ///
    /// The scale never drops below [`MIN_SCALE`]: on canvases no wider or
    /// taller than twice [`FIT_MARGIN`], or with a very large cutout, the
    /// cutout overflows the margins instead of vanishing.
    pub fn fit_to_frame(&mut self, cutout_width: u32, cutout_height: u32, canvas: CanvasSize) {
        let w = cutout_width.max(1) as f64;
        let h = cutout_height.max(1) as f64;
        let avail_w = canvas.width as f64 - 2.0 * FIT_MARGIN;
        let avail_h = canvas.height as f64 - 2.0 * FIT_MARGIN;

        self.scale = (avail_w / w).min(avail_h / h).max(MIN_SCALE);
        self.rotation = 0.0;
        self.tx = canvas.width as f64 / 2.0;
        self.ty = canvas.height as f64 / 2.0 + FIT_VERTICAL_OFFSET;
    }

    /// Move the cutout center to the canvas midpoint. Nothing else changes.
    pub fn center(&mut self, canvas: CanvasSize) {
        let (tx, ty) = canvas.center();
        self.tx = tx;
        self.ty = ty;
    }

    pub fn toggle_flip(&mut self) {
        self.flip_x = !self.flip_x;
    }

    /// Horizontal scale including the mirror.
    pub fn horizontal_scale(&self) -> f64 {
        if self.flip_x {
            -self.scale
        } else {
            self.scale
        }
    }

    /// Map a cutout pixel coordinate to canvas coordinates.
    pub fn cutout_to_canvas(&self, x: f64, y: f64, cutout_width: u32, cutout_height: u32) -> Point {
        let u = (x - cutout_width as f64 / 2.0) * self.horizontal_scale();
        let v = (y - cutout_height as f64 / 2.0) * self.scale;
        let (sin, cos) = self.rotation.sin_cos();

        Point::new(self.tx + cos * u - sin * v, self.ty + sin * u + cos * v)
    }

    /// Map a canvas coordinate back into cutout pixel space.
    ///
    /// Returns `None` when the scale is too small to invert.
    pub fn canvas_to_cutout(
        &self,
        x: f64,
        y: f64,
        cutout_width: u32,
        cutout_height: u32,
    ) -> Option<(f64, f64)> {
        if self.scale.abs() < f64::EPSILON {
            return None;
        }

        let dx = x - self.tx;
        let dy = y - self.ty;
        let (sin, cos) = self.rotation.sin_cos();
        let u = cos * dx + sin * dy;
        let v = -sin * dx + cos * dy;

        Some((
            u / self.horizontal_scale() + cutout_width as f64 / 2.0,
            v / self.scale + cutout_height as f64 / 2.0,
        ))
    }

    /// Axis-aligned canvas bounds `(min_x, min_y, max_x, max_y)` of the placed cutout.
    pub fn canvas_bounds(&self, cutout_width: u32, cutout_height: u32) -> (f64, f64, f64, f64) {
        let (w, h) = (cutout_width as f64, cutout_height as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
            .map(|(x, y)| self.cutout_to_canvas(x, y, cutout_width, cutout_height));

        corners.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}
