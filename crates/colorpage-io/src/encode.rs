//! PNG export.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colorpage_pipeline::PixelBuffer;
use image::ImageEncoder;

use crate::error::IoError;

/// Prefix of the data URL returned by [`png_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Suffix appended to the input stem by [`download_filename`].
const DOWNLOAD_SUFFIX: &str = "-coloring-page.png";

/// Name used when there is no usable input name.
const DEFAULT_DOWNLOAD_NAME: &str = "coloring-page.png";

/// Encode a buffer as an 8-bit RGBA PNG.
///
/// # Errors
///
/// Returns [`IoError::PngEncode`] if the encoder rejects the data.
pub fn encode_png(image: &PixelBuffer) -> Result<Vec<u8>, IoError> {
    let mut png = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(IoError::PngEncode)?;
    Ok(png)
}

/// Encode a buffer as a `data:image/png;base64,...` URL.
///
/// # Errors
///
/// Returns [`IoError::PngEncode`] if encoding fails.
pub fn png_data_url(image: &PixelBuffer) -> Result<String, IoError> {
    let png = encode_png(image)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Encode `image` as PNG and write it to `path`.
///
/// # Errors
///
/// Returns [`IoError::PngEncode`] or [`IoError::Write`].
pub fn save_png(path: &Path, image: &PixelBuffer) -> Result<(), IoError> {
    let png = encode_png(image)?;
    std::fs::write(path, &png).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = png.len(), "wrote PNG");
    Ok(())
}

/// Suggested file name for a downloaded coloring page.
///
/// `"photo.jpg"` becomes `"photo-coloring-page.png"`. Directory parts are
/// dropped. An empty name yields `"coloring-page.png"`.
#[must_use]
pub fn download_filename(source_name: &str) -> String {
    Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map_or_else(
            || DEFAULT_DOWNLOAD_NAME.to_owned(),
            |stem| format!("{stem}{DOWNLOAD_SUFFIX}"),
        )
}
