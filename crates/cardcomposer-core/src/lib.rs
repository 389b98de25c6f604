//! Card Composer Core - cutout and compositing engine
//!
//! This crate provides everything between a decoded character photo and a
//! flattened card image: preprocessing, segmentation mask normalization,
//! cutout building, gesture-driven placement and compositing onto a frame.
//!
//! # Module Structure
//!
//! - `raster` - RGBA buffers, resizing and cropping
//! - `preprocess` - tone/filter pipeline run before segmentation
//! - `mask` - normalization of heterogeneous segmentation output
//! - `cutout` - fusing a color raster with a mask
//! - `geometry` - affine placement state and the pointer gesture engine
//! - `compose` - rendering frame and cutout into the output canvas
//! - `segment` - the external segmentation capability and its cancellation
//! - `session` - the single session object that owns all mutable state
//! - `decode` / `encode` - image bytes in and PNG bytes out

use serde::{Deserialize, Serialize};

pub mod compose;
pub mod cutout;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod luminance;
pub mod mask;
pub mod preprocess;
pub mod raster;
pub mod segment;
pub mod session;

pub use compose::{render, render_contain};
pub use cutout::build_cutout;
pub use geometry::{AffineState, GestureEngine, GesturePhase, Point};
pub use mask::{normalize_mask, MaskBuffer, RawOutput};
pub use preprocess::preprocess;
pub use raster::{RasterBuffer, Rect};
pub use segment::{CancellationToken, SegmentationCapability, SegmentationOutcome};
pub use session::{CutoutJob, Session, SessionError};

/// Parameters for one preprocessing run.
///
/// There is no `Default`: callers pass a complete configuration
/// every time, or ask for [`PipelineConfig::reset`] explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Brightness offset (-100 to 100), added after contrast
    pub brightness: i32,
    /// Contrast (-100 to 100)
    pub contrast: i32,
    /// Gamma exponent (> 0, 1.0 = no change)
    pub gamma: f32,
    /// Unsharp mask strength (>= 0, 0.0 = disabled)
    pub sharpen_amount: f32,
    /// Subtract the low-frequency lighting field before tone correction
    pub normalize_background: bool,
    /// Crop to the detected subject bounds
    pub auto_crop: bool,
}

impl PipelineConfig {
    pub const BRIGHTNESS_RANGE: (i32, i32) = (-100, 100);
    pub const CONTRAST_RANGE: (i32, i32) = (-100, 100);
    /// Smallest gamma accepted; lower values are clamped.
    pub const MIN_GAMMA: f32 = 0.01;

    /// The values the controls return to on "reset".
    pub fn reset() -> Self {
        Self {
            brightness: 0,
            contrast: 20,
            gamma: 1.10,
            sharpen_amount: 0.35,
            normalize_background: true,
            auto_crop: true,
        }
    }

    /// A configuration that leaves pixels untouched (apart from the preview downscale).
    pub fn identity() -> Self {
        Self {
            brightness: 0,
            contrast: 0,
            gamma: 1.0,
            sharpen_amount: 0.0,
            normalize_background: false,
            auto_crop: false,
        }
    }

    /// Build a configuration from slider positions.
    ///
    /// Gamma and sharpen sliders are expressed in percent (110 = 1.10).
    pub fn from_controls(
        brightness: i32,
        contrast: i32,
        gamma_percent: i32,
        sharpen_percent: i32,
        normalize_background: bool,
        auto_crop: bool,
    ) -> Self {
        Self {
            brightness,
            contrast,
            gamma: gamma_percent as f32 / 100.0,
            sharpen_amount: sharpen_percent as f32 / 100.0,
            normalize_background,
            auto_crop,
        }
    }

    /// Clamp every field into its valid range.
    pub fn sanitized(&self) -> Self {
        let gamma = if self.gamma.is_finite() {
            self.gamma.max(Self::MIN_GAMMA)
        } else {
            1.0
        };
        let sharpen_amount = if self.sharpen_amount.is_finite() {
            self.sharpen_amount.max(0.0)
        } else {
            0.0
        };

        Self {
            brightness: self
                .brightness
                .clamp(Self::BRIGHTNESS_RANGE.0, Self::BRIGHTNESS_RANGE.1),
            contrast: self
                .contrast
                .clamp(Self::CONTRAST_RANGE.0, Self::CONTRAST_RANGE.1),
            gamma,
            sharpen_amount,
            ..*self
        }
    }

    /// Returns true if the always-on tone stage would not change any pixel.
    pub fn is_identity_tone(&self) -> bool {
        self.brightness == 0 && self.contrast == 0 && (self.gamma - 1.0).abs() < f32::EPSILON
    }
}

/// Square side, in pixels, of the image handed to the segmentation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InferenceSize {
    Px512,
    Px768,
    #[default]
    Px1024,
}

impl InferenceSize {
    pub fn side(self) -> u32 {
        match self {
            InferenceSize::Px512 => 512,
            InferenceSize::Px768 => 768,
            InferenceSize::Px1024 => 1024,
        }
    }

    /// Look up the variant for a side length; unknown sizes return `None`.
    pub fn from_side(side: u32) -> Option<Self> {
        match side {
            512 => Some(InferenceSize::Px512),
            768 => Some(InferenceSize::Px768),
            1024 => Some(InferenceSize::Px1024),
            _ => None,
        }
    }
}

/// Compute-backend hint forwarded untouched to the segmentation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComputeBackend {
    /// Let the capability choose.
    #[default]
    Auto,
    /// CPU / WASM fallback.
    Cpu,
    /// GPU accelerated (WebGPU).
    Accelerated,
}

impl ComputeBackend {
    /// Device string understood by the browser segmentation runtime.
    pub fn device_hint(self) -> Option<&'static str> {
        match self {
            ComputeBackend::Auto => None,
            ComputeBackend::Cpu => Some("wasm"),
            ComputeBackend::Accelerated => Some("webgpu"),
        }
    }

    /// Parse a device string; anything unrecognized means `Auto`.
    pub fn from_hint(hint: &str) -> Self {
        match hint {
            "wasm" | "cpu" => ComputeBackend::Cpu,
            "webgpu" | "gpu" => ComputeBackend::Accelerated,
            _ => ComputeBackend::Auto,
        }
    }
}

/// Size of the composite canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Canvas midpoint in canvas coordinates.
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        // Same proportions as the built-in demo frame
        Self::new(900, 1200)
    }
}

/// Session-wide settings that outlive a single preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub canvas: CanvasSize,
    pub inference_size: InferenceSize,
    pub backend: ComputeBackend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_values() {
        let config = PipelineConfig::reset();
        assert_eq!(config.brightness, 0);
        assert_eq!(config.contrast, 20);
        assert!((config.gamma - 1.10).abs() < f32::EPSILON);
        assert!((config.sharpen_amount - 0.35).abs() < f32::EPSILON);
        assert!(config.normalize_background);
        assert!(config.auto_crop);
    }

    #[test]
    fn test_identity_is_identity_tone() {
        assert!(PipelineConfig::identity().is_identity_tone());
        assert!(!PipelineConfig::reset().is_identity_tone());
    }

    #[test]
    fn test_from_controls_converts_percentages() {
        let config = PipelineConfig::from_controls(5, -10, 110, 35, false, true);
        assert_eq!(config.brightness, 5);
        assert_eq!(config.contrast, -10);
        assert!((config.gamma - 1.1).abs() < 1e-6);
        assert!((config.sharpen_amount - 0.35).abs() < 1e-6);
        assert!(!config.normalize_background);
        assert!(config.auto_crop);
    }

    #[test]
    fn test_sanitized_clamps_ranges() {
        let mut config = PipelineConfig::identity();
        config.brightness = 500;
        config.contrast = -300;
        config.gamma = 0.0;
        config.sharpen_amount = -2.0;

        let clean = config.sanitized();
        assert_eq!(clean.brightness, 100);
        assert_eq!(clean.contrast, -100);
        assert_eq!(clean.gamma, PipelineConfig::MIN_GAMMA);
        assert_eq!(clean.sharpen_amount, 0.0);
    }

    #[test]
    fn test_sanitized_replaces_nan() {
        let mut config = PipelineConfig::identity();
        config.gamma = f32::NAN;
        config.sharpen_amount = f32::INFINITY;

        let clean = config.sanitized();
        assert_eq!(clean.gamma, 1.0);
        assert_eq!(clean.sharpen_amount, 0.0);
    }

    #[test]
    fn test_inference_size_sides() {
        assert_eq!(InferenceSize::default().side(), 1024);
        assert_eq!(InferenceSize::from_side(512), Some(InferenceSize::Px512));
        assert_eq!(InferenceSize::from_side(600), None);
    }

    #[test]
    fn test_backend_hints() {
        assert_eq!(ComputeBackend::Auto.device_hint(), None);
        assert_eq!(ComputeBackend::Cpu.device_hint(), Some("wasm"));
        assert_eq!(ComputeBackend::Accelerated.device_hint(), Some("webgpu"));
        assert_eq!(ComputeBackend::from_hint("webgpu"), ComputeBackend::Accelerated);
        assert_eq!(ComputeBackend::from_hint("auto"), ComputeBackend::Auto);
    }

    #[test]
    fn test_canvas_center() {
        assert_eq!(CanvasSize::new(1000, 1400).center(), (500.0, 700.0));
        assert_eq!(CanvasSize::default(), CanvasSize::new(900, 1200));
    }
}
