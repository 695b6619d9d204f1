//! Separable box blur with edge-clamped windows.
//!
//! Approximates a 2D box blur of radius `r` with two 1D passes,
//! horizontal then vertical, each averaging the `2r + 1` samples
//! centred on the target pixel. Near the borders the window is cut to
//! the samples that exist and the divisor shrinks with it: there is no
//! wrap-around and no zero padding, so dark or light borders do not
//! bleed in from the opposite edge.
//!
//! Each output sample depends on its neighbours' *pre-blur* values, so
//! a pass never writes into the buffer it reads. The horizontal pass
//! reads the image and writes a scratch buffer; the vertical pass reads
//! the scratch buffer and writes the image back.
//!
//! The input is expected to be grayscale: the R channel is sampled and
//! the average is written to R, G and B. Alpha is forced to 255.
//!
//! In the sketch effect a larger radius spreads the inverted luminance
//! further, which after color-dodge shows up as thicker, softer lines.

use crate::types::{CHANNELS, PixelBuffer, fill_opaque_gray, quantize};

/// Box blur that keeps its scratch buffer between calls.
#[derive(Debug, Default, Clone)]
pub struct BoxBlur {
    scratch: Vec<u8>,
}

impl BoxBlur {
    /// Create a blur with no scratch space allocated yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scratch: Vec::new(),
        }
    }

    /// Blur `buffer` in place with the given radius.
    ///
    /// A radius of 0 leaves the buffer untouched.
    pub fn apply(&mut self, buffer: &mut PixelBuffer, radius: u32) {
        if radius < 1 {
            return;
        }

        let (width, height) = buffer.dimensions().as_usize();
        #[allow(clippy::cast_possible_truncation)]
        let radius = radius as usize;

        self.scratch.clear();
        self.scratch.resize(buffer.as_raw().len(), 0);

        let row_stride = width * CHANNELS;

        // Horizontal: image -> scratch.
        for y in 0..height {
            blur_line(
                buffer.as_raw(),
                &mut self.scratch,
                y * row_stride,
                CHANNELS,
                width,
                radius,
            );
        }

        // Vertical: scratch -> image.
        let pixels = buffer.pixels_mut();
        for x in 0..width {
            blur_line(
                &self.scratch,
                pixels,
                x * CHANNELS,
                row_stride,
                height,
                radius,
            );
        }
    }
}

/// Blur `buffer` in place. Convenience wrapper around [`BoxBlur`] for
/// one-off calls.
pub fn box_blur(buffer: &mut PixelBuffer, radius: u32) {
    BoxBlur::new().apply(buffer, radius);
}

/// Average one line of `len` pixels, `stride` bytes apart starting at
/// `offset`, from `src` into the same positions of `dst`.
///
/// Keeps a running sum over the clamped window `[i - r, i + r]`; the
/// count is the number of in-range samples, never zero because the
/// window always contains `i`.
fn blur_line(src: &[u8], dst: &mut [u8], offset: usize, stride: usize, len: usize, radius: usize) {
    let at = |i: usize| offset + i * stride;

    let mut sum: u64 = 0;
    let mut count: u32 = 0;
    for i in 0..=radius.min(len - 1) {
        sum += u64::from(src[at(i)]);
        count += 1;
    }

    for i in 0..len {
        #[allow(clippy::cast_precision_loss)]
        let average = sum as f64 / f64::from(count);
        let idx = at(i);
        fill_opaque_gray(&mut dst[idx..idx + CHANNELS], quantize(average));

        let incoming = i + radius + 1;
        if incoming < len {
            sum += u64::from(src[at(incoming)]);
            count += 1;
        }
        if i >= radius {
            sum -= u64::from(src[at(i - radius)]);
            count -= 1;
        }
    }
}
