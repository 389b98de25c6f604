//! Cutout building: fuse a color raster with a segmentation mask.

use thiserror::Error;
use tracing::instrument;

use crate::mask::MaskBuffer;
use crate::raster::{resize, FilterType, RasterBuffer, RasterError, CHANNELS};

/// Smallest side handed to the segmentation model.
pub const MIN_INFERENCE_SIDE: u32 = 8;

/// Errors produced while building a cutout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CutoutError {
    /// Color raster and mask disagree in size.
    #[error("Dimension mismatch: image is {image_width}x{image_height}, mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
}

/// Combine color and mask into an RGBA cutout.
///
/// RGB is copied from `image` unchanged and alpha is set to the mask sample
/// exactly. The result uses straight alpha, like every other raster here.
pub fn build_cutout(image: &RasterBuffer, mask: &MaskBuffer) -> Result<RasterBuffer, CutoutError> {
    if image.dimensions() != mask.dimensions() {
        return Err(CutoutError::DimensionMismatch {
            image_width: image.width(),
            image_height: image.height(),
            mask_width: mask.width(),
            mask_height: mask.height(),
        });
    }

    let mut output = image.clone();
    for (chunk, &alpha) in output
        .pixels_mut()
        .chunks_exact_mut(CHANNELS)
        .zip(mask.data())
    {
        chunk[3] = alpha;
    }

    Ok(output)
}

/// Dimensions of the segmentation input for a given inference side.
///
/// `s = min(1, side / max(w, h))`; each side is rounded and at least
/// [`MIN_INFERENCE_SIDE`].
pub fn inference_dimensions(width: u32, height: u32, side: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = (side as f64 / longest).min(1.0);

    let w = (width as f64 * scale).round() as u32;
    let h = (height as f64 * scale).round() as u32;
    (w.max(MIN_INFERENCE_SIDE), h.max(MIN_INFERENCE_SIDE))
}

/// Resize the prepared raster to the size the segmentation model receives.
#[instrument(skip(prepared), fields(width = prepared.width(), height = prepared.height()))]
pub fn prepare_inference_input(
    prepared: &RasterBuffer,
    side: u32,
) -> Result<RasterBuffer, RasterError> {
    let (w, h) = inference_dimensions(prepared.width(), prepared.height(), side);
    resize(prepared, w, h, FilterType::Bilinear)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Alpha equals the mask sample and RGB is untouched.
        #[test]
        fn prop_alpha_is_mask(
            pixels in prop::collection::vec(any::<u8>(), 4 * 4 * 3),
            mask in prop::collection::vec(any::<u8>(), 4 * 3),
        ) {
            let img = RasterBuffer::new(4, 3, pixels.clone()).unwrap();
            let mask_buf = MaskBuffer::new(4, 3, mask.clone()).unwrap();
            let cutout = build_cutout(&img, &mask_buf).unwrap();

            for (i, px) in cutout.pixels().chunks_exact(4).enumerate() {
                prop_assert_eq!(px[3], mask[i]);
                prop_assert_eq!(&px[..3], &pixels[i * 4..i * 4 + 3]);
            }
        }
    }
}
