//! Shared types for the colorpage pixel pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can convert to and from
/// [`PixelBuffer`] without depending on `image` directly.
pub use image::RgbaImage;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Alpha value written by every stage that forces opacity.
pub(crate) const OPAQUE: u8 = u8::MAX;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Number of bytes an RGBA buffer of this size occupies, or `None`
    /// if it does not fit in `usize`.
    #[must_use]
    pub fn byte_len(self) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        width.checked_mul(height)?.checked_mul(CHANNELS)
    }

    /// Width and height as `usize`, for indexing.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn as_usize(self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Check raw RGBA data against its claimed dimensions.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] if either side is zero.
/// Returns [`PipelineError::BufferSizeMismatch`] if `len` is not exactly
/// `width * height * 4`.
pub fn validate(width: u32, height: u32, len: usize) -> Result<Dimensions, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }

    let dimensions = Dimensions { width, height };
    let expected = dimensions.byte_len().unwrap_or(usize::MAX);
    if len != expected {
        return Err(PipelineError::BufferSizeMismatch {
            expected,
            actual: len,
        });
    }

    Ok(dimensions)
}

/// An RGBA raster: row-major, top-left origin, 4 bytes per pixel.
///
/// The fields are private so that every `PixelBuffer` in existence
/// satisfies `pixels.len() == width * height * 4` with non-zero sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// See [`validate`].
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PipelineError> {
        let dimensions = validate(width, height, pixels.len())?;
        Ok(Self { dimensions, pixels })
    }

    /// Create a buffer with every pixel set to `rgba`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] for a zero side, or
    /// [`PipelineError::BufferSizeMismatch`] if the size overflows.
    pub fn from_pixel(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PipelineError> {
        Self::from_fn(width, height, |_, _| rgba)
    }

    /// Create a buffer by evaluating `f(x, y)` for every pixel.
    ///
    /// # Errors
    ///
    /// Same as [`from_pixel`](Self::from_pixel).
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Result<Self, PipelineError> {
        let dimensions = Dimensions { width, height };
        let len = dimensions.byte_len().ok_or(PipelineError::BufferSizeMismatch {
            expected: usize::MAX,
            actual: 0,
        })?;
        validate(width, height, len)?;

        let mut pixels = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self { dimensions, pixels })
    }

    /// Copy `source` into recycled storage, keeping its allocation.
    pub(crate) fn copy_into(source: &Self, mut storage: Vec<u8>) -> Self {
        storage.clear();
        storage.extend_from_slice(&source.pixels);
        Self {
            dimensions: source.dimensions,
            pixels: storage,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Width and height.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The raw RGBA bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to the bytes. The length cannot change through a
    /// slice, so the size invariant holds.
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Consume the buffer and return the raw RGBA bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// The RGBA value at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }
        let (width, _) = self.dimensions.as_usize();
        #[allow(clippy::cast_possible_truncation)]
        let offset = (y as usize * width + x as usize) * CHANNELS;
        let px = &self.pixels[offset..offset + CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterate over all pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.pixels
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image::RgbaImage` without copying.
    #[must_use]
    pub fn into_rgba_image(self) -> RgbaImage {
        let Dimensions { width, height } = self.dimensions;
        // The length was validated on construction, so `from_raw` cannot
        // reject it.
        RgbaImage::from_raw(width, height, self.pixels)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = PipelineError;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

/// Store a computed channel value the way an 8-bit clamped canvas does:
/// NaN becomes 0, values are clamped to `[0, 255]`, and halves round to
/// even.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn quantize(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Write `value` into the R, G and B bytes of one pixel.
pub(crate) fn fill_rgb(px: &mut [u8], value: u8) {
    px[..3].fill(value);
}

/// Write `value` into R, G and B and force the pixel opaque.
pub(crate) fn fill_opaque_gray(px: &mut [u8], value: u8) {
    fill_rgb(px, value);
    px[3] = OPAQUE;
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Width or height is zero.
    #[error("invalid image dimensions {width}x{height}: both sides must be non-zero")]
    InvalidDimensions {
        /// Claimed width.
        width: u32,
        /// Claimed height.
        height: u32,
    },

    /// The pixel byte count does not match `width * height * 4`.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        /// Required byte count (`usize::MAX` if it overflows).
        expected: usize,
        /// Byte count supplied.
        actual: usize,
    },

    /// A parameter is not a usable number (e.g. NaN). Finite and
    /// infinite out-of-range values are clamped instead.
    #[error("parameter `{name}` is not a usable number: {value}")]
    ParameterOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Two buffers that must share a size do not.
    #[error("buffer dimensions differ: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Size of the reference buffer.
        expected: Dimensions,
        /// Size of the other buffer.
        actual: Dimensions,
    },
}
