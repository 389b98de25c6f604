//! Canonical single-channel mask.

use image::GrayImage;

use super::MaskError;

/// A single 8-bit opacity channel (0 = background, 255 = subject).
///
/// Produced by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MaskBuffer {
    /// Create a mask from dimensions and one byte per pixel.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InvalidDimensions` for a zero side and
    /// `MaskError::InvalidData` if the length is not `width * height`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(MaskError::InvalidData {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask with the same value everywhere.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, MaskError> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Opacity at `(x, y)`.
    #[inline]
    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear resample to new dimensions.
    ///
    /// Returns a clone when the size already matches.
    pub fn resample(&self, width: u32, height: u32) -> Result<MaskBuffer, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::InvalidDimensions { width, height });
        }
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }

        let gray = GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            MaskError::InvalidData {
                expected: self.width as usize * self.height as usize,
                actual: self.data.len(),
            },
        )?;
        let resized =
            image::imageops::resize(&gray, width, height, image::imageops::FilterType::Triangle);

        MaskBuffer::new(width, height, resized.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(MaskBuffer::new(2, 2, vec![0; 4]).is_ok());
        assert_eq!(
            MaskBuffer::new(2, 2, vec![0; 3]),
            Err(MaskError::InvalidData {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            MaskBuffer::new(0, 2, vec![]),
            Err(MaskError::InvalidDimensions {
                width: 0,
                height: 2
            })
        );
    }

    #[test]
    fn test_value_access() {
        let mask = MaskBuffer::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(mask.value(0, 0), 0);
        assert_eq!(mask.value(2, 0), 2);
        assert_eq!(mask.value(1, 1), 4);
    }

    #[test]
    fn test_resample_same_size_is_identity() {
        let mask = MaskBuffer::new(2, 2, vec![0, 255, 255, 0]).unwrap();
        assert_eq!(mask.resample(2, 2).unwrap(), mask);
    }

    #[test]
    fn test_resample_uniform_stays_uniform() {
        let mask = MaskBuffer::filled(8, 8, 255).unwrap();
        let up = mask.resample(20, 13).unwrap();
        assert_eq!(up.dimensions(), (20, 13));
        assert!(up.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_resample_rejects_zero() {
        let mask = MaskBuffer::filled(4, 4, 0).unwrap();
        assert!(mask.resample(0, 4).is_err());
    }

    #[test]
    fn test_resample_interpolates() {
        let mask = MaskBuffer::new(2, 1, vec![0, 255]).unwrap();
        let wide = mask.resample(8, 1).unwrap();
        // Left end stays dark, right end stays bright, something in between
        assert!(wide.value(0, 0) < 64);
        assert!(wide.value(7, 0) > 191);
        assert!(wide.data().iter().any(|&v| v > 64 && v < 191));
    }
}
