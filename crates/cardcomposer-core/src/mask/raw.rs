//! Structural model of what a segmentation capability can hand back.
//!
//! Segmentation runtimes return anything from a list of detected segments to
//! a bare image buffer. Bindings translate their host objects into this
//! closed set of shapes; the normalizer then picks the mask out of it.

/// Flat sample values.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskValues {
    /// 8-bit samples, already in 0..=255.
    Bytes(Vec<u8>),
    /// Floating-point samples, either probabilities in 0..=1 or levels in 0..=255.
    Numbers(Vec<f32>),
}

impl MaskValues {
    pub fn len(&self) -> usize {
        match self {
            MaskValues::Bytes(v) => v.len(),
            MaskValues::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for MaskValues {
    fn from(values: Vec<u8>) -> Self {
        MaskValues::Bytes(values)
    }
}

impl From<Vec<f32>> for MaskValues {
    fn from(values: Vec<f32>) -> Self {
        MaskValues::Numbers(values)
    }
}

/// An image-like buffer: interleaved samples with known dimensions.
///
/// When `channels` is `None` it is inferred from the data length.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub data: MaskValues,
    pub width: u32,
    pub height: u32,
    pub channels: Option<u32>,
}

impl RawImage {
    pub fn new(data: impl Into<MaskValues>, width: u32, height: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            channels: None,
        }
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }
}

/// One record returned by a segmentation runtime.
///
/// Every field is optional; which ones are present decides how the record is
/// interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Embedded mask image.
    pub mask: Option<RawImage>,
    /// Embedded segmentation image, used when `mask` is absent.
    pub segmentation: Option<RawImage>,
    /// Flat sample data carried on the record itself.
    pub data: Option<MaskValues>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub channels: Option<u32>,
    pub label: Option<String>,
    pub score: Option<f32>,
}

impl RawRecord {
    /// A record holding only an embedded mask image.
    pub fn with_mask(mask: RawImage) -> Self {
        Self {
            mask: Some(mask),
            ..Self::default()
        }
    }

    /// A record holding only flat data, without its own dimensions.
    pub fn with_data(data: impl Into<MaskValues>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// A record holding flat data and its dimensions.
    pub fn with_sized_data(data: impl Into<MaskValues>, width: u32, height: u32) -> Self {
        Self {
            data: Some(data.into()),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// The embedded image, preferring `mask` over `segmentation`.
    pub fn embedded_image(&self) -> Option<&RawImage> {
        self.mask.as_ref().or(self.segmentation.as_ref())
    }
}

/// Output of a segmentation call, in one of the shapes the normalizer accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// A list of detected-segment records; only the first is used.
    Segments(Vec<RawRecord>),
    /// A single record.
    Record(RawRecord),
    /// An image-like buffer handed back directly.
    Image(RawImage),
    /// Anything the bindings could not classify.
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_len() {
        assert_eq!(MaskValues::from(vec![1u8, 2, 3]).len(), 3);
        assert!(MaskValues::from(Vec::<f32>::new()).is_empty());
    }

    #[test]
    fn test_embedded_image_prefers_mask() {
        let mut record = RawRecord::with_mask(RawImage::new(vec![1u8], 1, 1));
        record.segmentation = Some(RawImage::new(vec![2u8], 1, 1));
        assert_eq!(
            record.embedded_image().map(|img| img.data.clone()),
            Some(MaskValues::Bytes(vec![1]))
        );

        record.mask = None;
        assert_eq!(
            record.embedded_image().map(|img| img.data.clone()),
            Some(MaskValues::Bytes(vec![2]))
        );
    }

    #[test]
    fn test_with_channels() {
        let img = RawImage::new(vec![0u8; 12], 1, 3).with_channels(4);
        assert_eq!(img.channels, Some(4));
    }
}
