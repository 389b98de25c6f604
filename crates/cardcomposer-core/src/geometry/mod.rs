//! Cutout placement geometry
//!
//! Pure math with no pixel access: the affine placement of the cutout on the
//! canvas, and the gesture engine that updates it from pointer samples.
//!
//! ## Gestures
//!
//! - **Drag** (one pointer): translation follows the pointer
//! - **Pinch** (two pointers): scale follows the pointer distance, rotation
//!   the pointer angle and translation the centroid

mod affine;
mod gesture;

pub use affine::{
    AffineState, Point, FIT_MARGIN, FIT_VERTICAL_OFFSET, MAX_SCALE, MIN_SCALE,
};
pub use gesture::{GestureEngine, GesturePhase, PointerId};
