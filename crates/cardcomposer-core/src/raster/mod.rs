//! In-memory RGBA raster buffers.
//!
//! Every stage of the cutout pipeline reads one `RasterBuffer` and produces a
//! new one that it owns exclusively. This module provides:
//! - The `RasterBuffer` type and its length invariant
//! - Integer `Rect` regions used by auto-crop
//! - Resizing (exact and fit-within) through the `image` crate
//! - Cropping to a pixel rectangle
//!
//! # Layout
//!
//! Pixels are stored row-major from the top-left corner, four interleaved
//! 8-bit channels per pixel in R, G, B, A order. Alpha is straight (not
//! premultiplied), matching what a browser `ImageData` hands out.

mod crop;
mod resize;
mod types;

pub use crop::crop;
pub use resize::{fit_dimensions, resize, resize_to_fit};
pub use types::{FilterType, RasterBuffer, RasterError, Rect, CHANNELS};
