//! Image decoding for character photos and frames.
//!
//! This module provides functionality for:
//! - Decoding JPEG and PNG files into RGBA rasters
//! - Reading the EXIF orientation and turning the image upright
//!
//! All operations are synchronous and single-threaded within WASM.

mod decoder;
mod orientation;

pub use decoder::decode_image;
pub use orientation::{get_orientation, Orientation};

use thiserror::Error;

/// Errors that can occur during image decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
        assert_eq!(
            DecodeError::CorruptedFile("eof".to_string()).to_string(),
            "Corrupted or incomplete image file: eof"
        );
    }
}
