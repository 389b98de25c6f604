//! Brightness, contrast and gamma as a single lookup table.
//!
//! The three operations are per-channel functions of the input byte, so they
//! collapse into one 256-entry table. The intermediate value between contrast
//! and gamma stays in floating point; only the final result is rounded.

use crate::raster::{RasterBuffer, CHANNELS};
use crate::PipelineConfig;

/// Pre-computed 256-entry lookup table for the tone stage.
#[derive(Debug, Clone)]
pub struct ToneLut {
    /// LUT values: lut[input] = output
    pub lut: [u8; 256],
}

impl ToneLut {
    /// Build the table for the given brightness, contrast and gamma.
    pub fn new(brightness: i32, contrast: i32, gamma: f32) -> Self {
        let cf = contrast_factor(contrast);
        let inv_gamma = 1.0 / gamma;
        let mut lut = [0u8; 256];

        for (i, lut_value) in lut.iter_mut().enumerate() {
            let v = (cf * (i as f32 - 128.0) + 128.0 + brightness as f32).clamp(0.0, 255.0);
            let v = (255.0 * (v / 255.0).powf(inv_gamma)).clamp(0.0, 255.0);
            *lut_value = v.round() as u8;
        }

        Self { lut }
    }

    /// Build the table from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.brightness, config.contrast, config.gamma)
    }

    /// Create identity LUT (no change).
    pub fn identity() -> Self {
        let mut lut = [0u8; 256];
        for (i, lut_value) in lut.iter_mut().enumerate() {
            *lut_value = i as u8;
        }
        Self { lut }
    }

    /// Check if this LUT is identity.
    pub fn is_identity(&self) -> bool {
        self.lut.iter().enumerate().all(|(i, &v)| v == i as u8)
    }
}

/// Contrast multiplier for a contrast setting in -100..=100.
///
/// Formula: `cf = 259 * (c + 255) / (255 * (259 - c))`
#[inline]
pub fn contrast_factor(contrast: i32) -> f32 {
    let c = contrast as f32;
    (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
}

/// Apply brightness, contrast and gamma to the color channels in place.
///
/// Alpha is left untouched.
pub fn apply_tone(image: &mut RasterBuffer, config: &PipelineConfig) {
    let lut = ToneLut::from_config(config);

    // Early exit for identity
    if lut.is_identity() {
        return;
    }

    for chunk in image.pixels_mut().chunks_exact_mut(CHANNELS) {
        chunk[0] = lut.lut[chunk[0] as usize];
        chunk[1] = lut.lut[chunk[1] as usize];
        chunk[2] = lut.lut[chunk[2] as usize];
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: The identity configuration never changes a pixel.
        #[test]
        fn prop_identity_config_preserves_pixels(
            pixels in prop::collection::vec(any::<u8>(), 4 * 6 * 5)
        ) {
            let mut img = RasterBuffer::new(6, 5, pixels.clone()).unwrap();
            apply_tone(&mut img, &PipelineConfig::identity());
            prop_assert_eq!(img.pixels(), &pixels[..]);
        }

        /// Property: With positive contrast the table is monotonically non-decreasing.
        #[test]
        fn prop_lut_monotonic(
            brightness in -100i32..=100,
            contrast in 0i32..=100,
            gamma in 0.2f32..5.0,
        ) {
            let lut = ToneLut::new(brightness, contrast, gamma);
            for i in 1..256 {
                prop_assert!(lut.lut[i] >= lut.lut[i - 1]);
            }
        }
    }
}
