//! Raster resizing for the preview cap, inference input and frame stretching.
//!
//! All functions return new `RasterBuffer` instances without modifying the input.

use super::{FilterType, RasterBuffer, RasterError};

/// Resize a raster to exact dimensions.
///
/// The aspect ratio is not preserved; the compositor relies on this to stretch
/// a frame over the whole canvas.
///
/// # Errors
///
/// Returns `RasterError::InvalidDimensions` if either target side is zero.
pub fn resize(
    image: &RasterBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RasterBuffer, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    let rgba = image.to_rgba_image().ok_or(RasterError::InvalidPixelData {
        expected: image.pixel_count() * super::types::CHANNELS,
        actual: image.byte_size(),
    })?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());

    RasterBuffer::from_rgba_image(resized)
}

/// Shrink a raster so its longer side is at most `max_edge`, preserving aspect ratio.
///
/// Rasters that already fit are returned unchanged; this never upscales.
///
/// # Errors
///
/// Returns `RasterError::InvalidDimensions` if `max_edge` is zero.
pub fn resize_to_fit(
    image: &RasterBuffer,
    max_edge: u32,
    filter: FilterType,
) -> Result<RasterBuffer, RasterError> {
    if max_edge == 0 {
        return Err(RasterError::InvalidDimensions {
            width: max_edge,
            height: max_edge,
        });
    }

    if image.longest_edge() <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = fit_dimensions(image.width(), image.height(), max_edge);
    resize(image, new_width, new_height, filter)
}

/// Dimensions that fit within `max_edge` on the longer side.
///
/// Uses the scale `s = min(1, max_edge / max(width, height))` and rounds each
/// side independently, never returning a side smaller than 1.
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let longest = width.max(height) as f64;
    let scale = (max_edge as f64 / longest).min(1.0);

    let new_width = (width as f64 * scale).round() as u32;
    let new_height = (height as f64 * scale).round() as u32;

    (new_width.max(1), new_height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> RasterBuffer {
        // Gradient image with opaque alpha
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
                pixels.push(255);
            }
        }
        RasterBuffer::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.dimensions(), (50, 25));
        assert_eq!(resized.pixels().len(), 50 * 25 * 4);
    }

    #[test]
    fn test_resize_non_uniform_stretch() {
        let img = create_test_image(30, 40);
        let resized = resize(&img, 90, 20, FilterType::Bilinear).unwrap();
        assert_eq!(resized.dimensions(), (90, 20));
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 100, 50, FilterType::Lanczos3).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_preserves_opaque_alpha() {
        let img = create_test_image(64, 64);
        let resized = resize(&img, 20, 20, FilterType::Lanczos3).unwrap();
        assert!(resized.pixels().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_resize_to_fit_landscape() {
        let img = create_test_image(2800, 1400);
        let resized = resize_to_fit(&img, 1400, FilterType::Lanczos3).unwrap();
        assert_eq!(resized.dimensions(), (1400, 700));
    }

    #[test]
    fn test_resize_to_fit_portrait() {
        let img = create_test_image(1500, 3000);
        let resized = resize_to_fit(&img, 1400, FilterType::Bilinear).unwrap();
        assert_eq!(resized.dimensions(), (700, 1400));
    }

    #[test]
    fn test_resize_to_fit_already_smaller() {
        let img = create_test_image(100, 50);
        let resized = resize_to_fit(&img, 1400, FilterType::Lanczos3).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_to_fit_zero_max_edge_error() {
        let img = create_test_image(100, 50);
        assert!(resize_to_fit(&img, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_fit_dimensions_rounding() {
        // 6000x4000 at 1400: s = 0.2333.., 4000 * s = 933.33 -> 933
        assert_eq!(fit_dimensions(6000, 4000, 1400), (1400, 933));
        assert_eq!(fit_dimensions(4000, 6000, 1400), (933, 1400));
    }

    #[test]
    fn test_fit_dimensions_never_upscales() {
        assert_eq!(fit_dimensions(300, 200, 1024), (300, 200));
    }

    #[test]
    fn test_fit_dimensions_extreme_aspect() {
        // Thin strips keep at least one pixel
        assert_eq!(fit_dimensions(10000, 2, 1000), (1000, 1));
    }

    #[test]
    fn test_fit_dimensions_zero_input() {
        assert_eq!(fit_dimensions(0, 0, 256), (0, 0));
    }
}
