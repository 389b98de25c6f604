//! Tone/filter pipeline run on the character photo before segmentation.
//!
//! ## Stage Order
//! 1. Downscale to the preview cap (always)
//! 2. Background normalization (optional)
//! 3. Brightness / contrast / gamma (always)
//! 4. Unsharp mask (when the amount is above zero)
//! 5. Auto-crop (optional)
//!
//! Every stage produces a new buffer; alpha is carried through unchanged.

mod autocrop;
mod composite;
mod normalize;
mod sharpen;
mod tone;

pub use autocrop::{
    detect_content_rect, estimate_background_luminance, CONTENT_THRESHOLD, CROP_PADDING,
};
pub use composite::{self_composite, FloatLayer};
pub use normalize::{blur_offsets, normalize_background};
pub use sharpen::{unsharp_mask, MIN_SHARPEN_AMOUNT, SHARPEN_GAIN};
pub use tone::{apply_tone, contrast_factor, ToneLut};

use tracing::{debug, instrument};

use crate::raster::{crop, resize_to_fit, FilterType, RasterBuffer, RasterError};
use crate::PipelineConfig;

/// Longest side allowed for the preprocessed preview.
pub const PREVIEW_MAX_EDGE: u32 = 1400;

/// Shrink the source so its longer side is at most [`PREVIEW_MAX_EDGE`].
pub fn downscale_for_preview(source: &RasterBuffer) -> Result<RasterBuffer, RasterError> {
    resize_to_fit(source, PREVIEW_MAX_EDGE, FilterType::Lanczos3)
}

/// Run the full preprocessing pipeline.
///
/// # Arguments
/// * `source` - The decoded character photo
/// * `config` - Pipeline parameters; out-of-range values are clamped first
///
/// # Returns
/// A new raster, no larger than [`PREVIEW_MAX_EDGE`] on its longer side and
/// cropped to the detected content when auto-crop is enabled.
#[instrument(skip_all, fields(width = source.width(), height = source.height()))]
pub fn preprocess(
    source: &RasterBuffer,
    config: &PipelineConfig,
) -> Result<RasterBuffer, RasterError> {
    let config = config.sanitized();

    let mut image = downscale_for_preview(source)?;
    debug!(width = image.width(), height = image.height(), "working size");

    if config.normalize_background {
        image = normalize_background(&image);
    }

    apply_tone(&mut image, &config);

    if config.sharpen_amount > MIN_SHARPEN_AMOUNT {
        image = unsharp_mask(&image, config.sharpen_amount);
    }

    if config.auto_crop {
        let rect = detect_content_rect(&image);
        debug!(?rect, "auto-crop");
        image = crop(&image, rect);
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rect;

    fn gradient(width: u32, height: u32) -> RasterBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(((x + y) % 256) as u8);
                pixels.push(255);
            }
        }
        RasterBuffer::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_identity_preserves_small_image() {
        let img = gradient(40, 30);
        let result = preprocess(&img, &PipelineConfig::identity()).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_downscale_caps_longer_side() {
        let img = RasterBuffer::filled(2000, 1000, [50, 60, 70, 255]).unwrap();
        let result = preprocess(&img, &PipelineConfig::identity()).unwrap();
        assert_eq!(result.dimensions(), (1400, 700));
    }

    #[test]
    fn test_reset_config_runs_all_stages() {
        let mut img = RasterBuffer::filled(200, 160, [235, 235, 235, 255]).unwrap();
        for y in 50..110 {
            for x in 60..140 {
                img.put_pixel(x, y, [30, 40, 50, 255]);
            }
        }

        let result = preprocess(&img, &PipelineConfig::reset()).unwrap();
        assert!(result.width() < 200);
        assert!(result.height() < 160);
    }

    #[test]
    fn test_auto_crop_only() {
        let mut img = RasterBuffer::filled(120, 120, [250, 250, 250, 255]).unwrap();
        for y in 40..80 {
            for x in 40..80 {
                img.put_pixel(x, y, [0, 0, 0, 255]);
            }
        }
        let mut config = PipelineConfig::identity();
        config.auto_crop = true;

        let result = preprocess(&img, &config).unwrap();
        // Content scanned at 40..=78, padded by 18
        assert_eq!(result.dimensions(), (96 - 22 + 1, 96 - 22 + 1));
        assert_eq!(result, crop(&img, Rect::new(22, 22, 75, 75)));
    }

    #[test]
    fn test_alpha_carried_through_all_stages() {
        let mut img = RasterBuffer::filled(64, 64, [180, 180, 180, 140]).unwrap();
        img.put_pixel(30, 30, [10, 10, 10, 140]);
        let mut config = PipelineConfig::reset();
        config.auto_crop = false;

        let result = preprocess(&img, &config).unwrap();
        assert!(result.pixels().chunks_exact(4).all(|p| p[3] == 140));
    }
}
