//! Segmentation mask normalization
//!
//! Segmentation runtimes return their result in several shapes (segment
//! lists, records with embedded images, flat arrays, bare image buffers)
//! and value ranges (probabilities or 8-bit levels). This module turns any
//! of them into a single-channel [`MaskBuffer`] at a requested size.
//!
//! ## Shapes
//!
//! - **Segment list**: the first record is used
//! - **Record**: embedded `mask`/`segmentation` image, else flat `data`
//! - **Image**: interleaved buffer with 1-4 channels; channel 0 is the opacity

mod buffer;
mod normalize;
mod raw;

pub use buffer::MaskBuffer;
pub use normalize::{normalize_mask, MaskShape, UNIT_RANGE_LIMIT};
pub use raw::{MaskValues, RawImage, RawOutput, RawRecord};

use thiserror::Error;

/// Errors produced while normalizing a segmentation result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    /// None of the known output shapes matched.
    #[error("Unrecognized mask format: {0}")]
    UnrecognizedFormat(&'static str),

    /// Mask width or height is zero.
    #[error("Invalid mask dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Sample count doesn't match the dimensions.
    #[error("Invalid mask data: expected {expected} values, got {actual}")]
    InvalidData { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            MaskError::UnrecognizedFormat("empty segment list").to_string(),
            "Unrecognized mask format: empty segment list"
        );
        assert_eq!(
            MaskError::InvalidData {
                expected: 4,
                actual: 3
            }
            .to_string(),
            "Invalid mask data: expected 4 values, got 3"
        );
    }
}
