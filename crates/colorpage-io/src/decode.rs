//! Image decoding and fitting to the working width.
//!
//! Uploaded photos are decoded to RGBA and, when wider than the working
//! width, scaled down before the pipeline runs. The blur cost grows with
//! pixel count, so this keeps re-renders on slider changes fast.

use std::path::Path;

use colorpage_pipeline::PixelBuffer;
use image::imageops::FilterType;

use crate::error::IoError;

/// Widest image the pipeline is run on by default.
pub const MAX_WORKING_WIDTH: u32 = 1200;

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) into an RGBA buffer.
///
/// # Errors
///
/// Returns [`IoError::EmptyInput`] if `bytes` is empty.
/// Returns [`IoError::ImageDecode`] if the format is unrecognized or
/// the data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, IoError> {
    if bytes.is_empty() {
        return Err(IoError::EmptyInput);
    }

    let decoded = image::load_from_memory(bytes).map_err(IoError::ImageDecode)?;
    Ok(PixelBuffer::try_from(decoded.to_rgba8())?)
}

/// Scale `image` down to `max_width` pixels wide, keeping the aspect
/// ratio. The new height is rounded down (minimum 1).
///
/// Images already at or below `max_width` are returned unchanged, as is
/// everything when `max_width` is 0. The flag reports whether resizing
/// happened.
///
/// # Errors
///
/// Returns [`IoError::Pipeline`] if the resized raster is rejected,
/// which cannot happen for non-zero target sizes.
pub fn fit_to_width(image: PixelBuffer, max_width: u32) -> Result<(PixelBuffer, bool), IoError> {
    if max_width == 0 || image.width() <= max_width {
        return Ok((image, false));
    }

    let height = scaled_height(image.width(), image.height(), max_width);
    let resized = image::imageops::resize(
        &image.into_rgba_image(),
        max_width,
        height,
        FilterType::Triangle,
    );
    Ok((PixelBuffer::try_from(resized)?, true))
}

/// `height * max_width / width`, rounded down, at least 1.
fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(max_width) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Read, decode and fit an image file.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read, plus anything
/// [`decode_image`] or [`fit_to_width`] can return.
pub fn load_image(path: &Path, max_width: u32) -> Result<PixelBuffer, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_image(&bytes)?;
    let original = decoded.dimensions();
    let (image, resized) = fit_to_width(decoded, max_width)?;
    if resized {
        tracing::debug!(
            path = %path.display(),
            %original,
            working = %image.dimensions(),
            "scaled image to working width",
        );
    } else {
        tracing::debug!(path = %path.display(), dimensions = %original, "decoded image");
    }
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::ImageEncoder;

    use super::*;

    fn png_bytes(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        buf
    }

    fn gray(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_pixel(width, height, [128, 128, 128, 255]).unwrap()
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_image(&[]), Err(IoError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_return_decode_error() {
        assert!(matches!(
            decode_image(&[0xFF, 0xFE, 0x00, 0x01]),
            Err(IoError::ImageDecode(_))
        ));
    }

    #[test]
    fn png_decodes_to_rgba() {
        let img = image::RgbaImage::from_fn(5, 3, |x, y| {
            image::Rgba([u8::try_from(x * 50).unwrap(), u8::try_from(y).unwrap(), 9, 200])
        });
        let decoded = decode_image(&png_bytes(&img)).unwrap();
        assert_eq!(decoded.width(), 5);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.as_raw(), img.as_raw().as_slice());
    }

    #[test]
    fn narrow_image_is_not_resized() {
        let (out, resized) = fit_to_width(gray(800, 600), MAX_WORKING_WIDTH).unwrap();
        assert!(!resized);
        assert_eq!((out.width(), out.height()), (800, 600));
    }

    #[test]
    fn exact_width_is_not_resized() {
        let (out, resized) = fit_to_width(gray(1200, 90), MAX_WORKING_WIDTH).unwrap();
        assert!(!resized);
        assert_eq!(out.width(), 1200);
    }

    #[test]
    fn wide_image_is_scaled_to_max_width() {
        let (out, resized) = fit_to_width(gray(2400, 1000), MAX_WORKING_WIDTH).unwrap();
        assert!(resized);
        assert_eq!((out.width(), out.height()), (1200, 500));
    }

    #[test]
    fn scaled_height_rounds_down() {
        // 333 * 100 / 301 = 110.63
        let (out, _) = fit_to_width(gray(301, 333), 100).unwrap();
        assert_eq!((out.width(), out.height()), (100, 110));
    }

    #[test]
    fn very_flat_image_keeps_one_row() {
        let (out, resized) = fit_to_width(gray(5000, 1), 100).unwrap();
        assert!(resized);
        assert_eq!((out.width(), out.height()), (100, 1));
    }

    #[test]
    fn zero_max_width_disables_fitting() {
        let (out, resized) = fit_to_width(gray(3000, 20), 0).unwrap();
        assert!(!resized);
        assert_eq!(out.width(), 3000);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_image(Path::new("definitely/not/here.png"), MAX_WORKING_WIDTH);
        assert!(matches!(result, Err(IoError::Read { .. })));
    }
}
