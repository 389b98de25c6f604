//! Shape detection and conversion to a [`MaskBuffer`].
//!
//! ## Priority
//! 1. Segment list: first record's embedded mask/segmentation image, else its data
//! 2. Single record: embedded mask/segmentation image, else its data
//! 3. Image-like buffer: channel 0 of every pixel
//!
//! Record data is read with the record's own width/height when present and
//! with the target size otherwise. Anything else fails fast.

use tracing::{debug, instrument};

use super::raw::{MaskValues, RawImage, RawOutput, RawRecord};
use super::{MaskBuffer, MaskError};

/// Float samples at or below this maximum are treated as probabilities; byte
/// samples are treated as binary when their maximum is at most 1.
pub const UNIT_RANGE_LIMIT: f32 = 1.001;

/// The mask located inside a raw output, borrowed from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskShape<'a> {
    pub values: &'a MaskValues,
    pub width: u32,
    pub height: u32,
    /// Interleaved channels per pixel; only the first is used.
    pub channels: u32,
}

impl<'a> MaskShape<'a> {
    /// Locate the mask inside `raw`, in priority order.
    ///
    /// `target_width`/`target_height` give the dimensions assumed for record
    /// data that carries no size of its own.
    pub fn detect(
        raw: &'a RawOutput,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self, MaskError> {
        match raw {
            RawOutput::Segments(records) => {
                let first = records
                    .first()
                    .ok_or(MaskError::UnrecognizedFormat("empty segment list"))?;
                Self::from_record(first, target_width, target_height)
            }
            RawOutput::Record(record) => Self::from_record(record, target_width, target_height),
            RawOutput::Image(image) => Self::from_image(image),
            RawOutput::Unsupported(_) => Err(MaskError::UnrecognizedFormat(
                "not a segment list, record or image",
            )),
        }
    }

    fn from_record(
        record: &'a RawRecord,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self, MaskError> {
        if let Some(image) = record.embedded_image() {
            return Self::from_image(image);
        }

        let values = record
            .data
            .as_ref()
            .ok_or(MaskError::UnrecognizedFormat("record has no mask or data"))?;

        match (record.width, record.height) {
            (Some(width), Some(height)) => {
                let channels = infer_channels(values.len(), width, height, record.channels)?;
                Ok(Self {
                    values,
                    width,
                    height,
                    channels,
                })
            }
            _ => {
                let expected = target_width as usize * target_height as usize;
                if values.len() != expected {
                    return Err(MaskError::InvalidData {
                        expected,
                        actual: values.len(),
                    });
                }
                Ok(Self {
                    values,
                    width: target_width,
                    height: target_height,
                    channels: 1,
                })
            }
        }
    }

    fn from_image(image: &'a RawImage) -> Result<Self, MaskError> {
        let channels = infer_channels(image.data.len(), image.width, image.height, image.channels)?;
        Ok(Self {
            values: &image.data,
            width: image.width,
            height: image.height,
            channels,
        })
    }

    /// Convert channel 0 to 8-bit opacity at the shape's native size.
    pub fn to_mask(&self) -> Result<MaskBuffer, MaskError> {
        let stride = self.channels as usize;
        let count = self.width as usize * self.height as usize;

        let data = match self.values {
            MaskValues::Bytes(bytes) => {
                let samples = bytes.iter().step_by(stride).take(count);
                let max = samples.clone().copied().max().unwrap_or(0);
                // Binary 0/1 masks share the unit-range rule with float masks
                let scale = if max <= 1 { 255 } else { 1 };
                debug!(max, scale, "byte mask range");

                samples.map(|&v| v * scale).collect()
            }
            MaskValues::Numbers(numbers) => {
                let samples = numbers.iter().step_by(stride).take(count);
                let max = samples
                    .clone()
                    .copied()
                    .filter(|v| v.is_finite())
                    .fold(f32::NEG_INFINITY, f32::max);
                let scale = if max <= UNIT_RANGE_LIMIT { 255.0 } else { 1.0 };
                debug!(max, scale, "float mask range");

                samples
                    .map(|&v| {
                        if v.is_nan() {
                            0
                        } else {
                            (v * scale).round().clamp(0.0, 255.0) as u8
                        }
                    })
                    .collect()
            }
        };

        MaskBuffer::new(self.width, self.height, data)
    }
}

/// Channel count of an image-like buffer, explicit or inferred from its length.
fn infer_channels(
    len: usize,
    width: u32,
    height: u32,
    channels: Option<u32>,
) -> Result<u32, MaskError> {
    if width == 0 || height == 0 {
        return Err(MaskError::InvalidDimensions { width, height });
    }

    let pixels = width as usize * height as usize;
    let channels = match channels {
        Some(c) => c as usize,
        None if len % pixels == 0 => len / pixels,
        None => 0,
    };

    if !(1..=4).contains(&channels) || len != pixels * channels {
        return Err(MaskError::InvalidData {
            expected: pixels * channels.max(1),
            actual: len,
        });
    }

    Ok(channels as u32)
}

/// Normalize a segmentation output into a mask of exactly `target_width x target_height`.
///
/// # Arguments
/// * `raw` - Output of the segmentation capability
/// * `target_width`, `target_height` - Size of the image that was segmented
///
/// # Returns
/// A mask at the target size. Samples in 0..=1 are scaled to 0..=255, all
/// samples are rounded and clamped, and the native-resolution mask is
/// bilinearly resampled when its size differs from the target.
#[instrument(skip(raw))]
pub fn normalize_mask(
    raw: &RawOutput,
    target_width: u32,
    target_height: u32,
) -> Result<MaskBuffer, MaskError> {
    if target_width == 0 || target_height == 0 {
        return Err(MaskError::InvalidDimensions {
            width: target_width,
            height: target_height,
        });
    }

    let shape = MaskShape::detect(raw, target_width, target_height)?;
    debug!(
        width = shape.width,
        height = shape.height,
        channels = shape.channels,
        "detected mask shape"
    );

    shape.to_mask()?.resample(target_width, target_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_unit_mask() {
        let raw = RawOutput::Record(RawRecord::with_mask(RawImage::new(
            vec![0.0f32, 1.0, 1.0, 0.0],
            2,
            2,
        )));
        let mask = normalize_mask(&raw, 2, 2).unwrap();
        assert_eq!(mask.data(), &[0, 255, 255, 0]);
    }

    #[test]
    fn test_segment_list_uses_first_record() {
        let raw = RawOutput::Segments(vec![
            RawRecord::with_mask(RawImage::new(vec![255u8, 0], 2, 1)),
            RawRecord::with_mask(RawImage::new(vec![0u8, 255], 2, 1)),
        ]);
        let mask = normalize_mask(&raw, 2, 1).unwrap();
        assert_eq!(mask.data(), &[255, 0]);
    }

    #[test]
    fn test_segment_list_with_flat_data_uses_target_size() {
        let raw = RawOutput::Segments(vec![RawRecord::with_data(vec![0.5f32; 6])]);
        let mask = normalize_mask(&raw, 3, 2).unwrap();
        assert_eq!(mask.dimensions(), (3, 2));
        // 0.5 * 255 = 127.5 rounds to 128
        assert!(mask.data().iter().all(|&v| v == 128));
    }

    #[test]
    fn test_segmentation_key_fallback() {
        let record = RawRecord {
            segmentation: Some(RawImage::new(vec![10u8, 20, 30, 40], 2, 2)),
            ..RawRecord::default()
        };
        let mask = normalize_mask(&RawOutput::Record(record), 2, 2).unwrap();
        assert_eq!(mask.data(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_record_with_sized_data() {
        let raw = RawOutput::Record(RawRecord::with_sized_data(vec![0u8, 200], 1, 2));
        let shape = MaskShape::detect(&raw, 99, 99).unwrap();
        assert_eq!((shape.width, shape.height, shape.channels), (1, 2, 1));

        let mask = normalize_mask(&raw, 1, 2).unwrap();
        assert_eq!(mask.data(), &[0, 200]);
    }

    #[test]
    fn test_rgba_image_uses_first_channel() {
        let data = vec![
            255u8, 0, 0, 255, //
            0, 255, 255, 255, //
        ];
        let raw = RawOutput::Image(RawImage::new(data, 2, 1));
        let mask = normalize_mask(&raw, 2, 1).unwrap();
        assert_eq!(mask.data(), &[255, 0]);
    }

    #[test]
    fn test_explicit_rgb_channels() {
        let raw = RawOutput::Image(RawImage::new(vec![7u8, 1, 1, 9, 1, 1], 2, 1).with_channels(3));
        assert_eq!(normalize_mask(&raw, 2, 1).unwrap().data(), &[7, 9]);
    }

    #[test]
    fn test_float_levels_not_rescaled() {
        let raw = RawOutput::Image(RawImage::new(vec![0.4f32, 254.6, 300.0, -5.0], 4, 1));
        let mask = normalize_mask(&raw, 4, 1).unwrap();
        assert_eq!(mask.data(), &[0, 255, 255, 0]);
    }

    #[test]
    fn test_binary_byte_mask_is_rescaled() {
        let raw = RawOutput::Record(RawRecord::with_mask(RawImage::new(vec![0u8, 1, 1, 0], 2, 2)));
        assert_eq!(normalize_mask(&raw, 2, 2).unwrap().data(), &[0, 255, 255, 0]);
    }

    #[test]
    fn test_byte_levels_not_rescaled() {
        let raw = RawOutput::Image(RawImage::new(vec![0u8, 1, 2, 255], 4, 1));
        assert_eq!(normalize_mask(&raw, 4, 1).unwrap().data(), &[0, 1, 2, 255]);
    }

    #[test]
    fn test_resampled_to_target() {
        let raw = RawOutput::Image(RawImage::new(vec![255u8; 16], 4, 4));
        let mask = normalize_mask(&raw, 10, 6).unwrap();
        assert_eq!(mask.dimensions(), (10, 6));
        assert!(mask.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_unsupported_is_unrecognized() {
        let raw = RawOutput::Unsupported("number".to_string());
        assert!(matches!(
            normalize_mask(&raw, 2, 2),
            Err(MaskError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_empty_segment_list_is_unrecognized() {
        assert!(matches!(
            normalize_mask(&RawOutput::Segments(vec![]), 2, 2),
            Err(MaskError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_record_without_mask_or_data_is_unrecognized() {
        let record = RawRecord {
            label: Some("person".to_string()),
            score: Some(0.9),
            ..RawRecord::default()
        };
        assert!(matches!(
            normalize_mask(&RawOutput::Record(record), 2, 2),
            Err(MaskError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_unsized_data_of_wrong_length_fails() {
        let raw = RawOutput::Record(RawRecord::with_data(vec![1u8; 5]));
        assert_eq!(
            normalize_mask(&raw, 2, 2),
            Err(MaskError::InvalidData {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn test_image_with_odd_length_fails() {
        let raw = RawOutput::Image(RawImage::new(vec![0u8; 7], 2, 2));
        assert!(matches!(
            normalize_mask(&raw, 2, 2),
            Err(MaskError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_zero_target_fails() {
        let raw = RawOutput::Image(RawImage::new(vec![0u8; 4], 2, 2));
        assert!(matches!(
            normalize_mask(&raw, 0, 2),
            Err(MaskError::InvalidDimensions { .. })
        ));
    }
}
