//! Color-dodge blending of the grayscale image with its blurred negative.
//!
//! Dividing the base by the inverse of the blend brightens flat regions
//! to white (where the blurred negative is close to the exact negative)
//! and leaves edges dark (where the blur has smeared the negative).

use crate::types::{CHANNELS, PipelineError, PixelBuffer, fill_opaque_gray, quantize};

/// Dodge one base value with one blend value.
///
/// `blend == 255` yields 255 directly; the general formula would divide
/// by zero there, and fully white blend pixels are common after a
/// strong blur.
#[must_use]
pub fn dodge_value(base: u8, blend: u8) -> u8 {
    if blend == u8::MAX {
        return u8::MAX;
    }
    let value = f64::from(base) / f64::from(u8::MAX - blend) * 255.0;
    quantize(value.min(255.0))
}

/// Dodge `base` with `blend`, writing the result into `target`.
///
/// Each output pixel depends only on the same pixel of both inputs.
/// R of each input is sampled; the result goes to R, G and B of
/// `target`, whose alpha is forced to 255.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the three buffers are
/// not the same size.
pub fn color_dodge(
    base: &PixelBuffer,
    blend: &PixelBuffer,
    target: &mut PixelBuffer,
) -> Result<(), PipelineError> {
    ensure_same_size(base, blend)?;
    ensure_same_size(base, target)?;

    let inputs = base
        .as_raw()
        .chunks_exact(CHANNELS)
        .zip(blend.as_raw().chunks_exact(CHANNELS));
    for ((b, l), out) in inputs.zip(target.pixels_mut().chunks_exact_mut(CHANNELS)) {
        fill_opaque_gray(out, dodge_value(b[0], l[0]));
    }
    Ok(())
}

/// Dodge `base` with `blend`, overwriting `base`.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the buffers differ in
/// size.
pub fn color_dodge_in_place(
    base: &mut PixelBuffer,
    blend: &PixelBuffer,
) -> Result<(), PipelineError> {
    ensure_same_size(base, blend)?;

    let pairs = base
        .pixels_mut()
        .chunks_exact_mut(CHANNELS)
        .zip(blend.as_raw().chunks_exact(CHANNELS));
    for (px, l) in pairs {
        let value = dodge_value(px[0], l[0]);
        fill_opaque_gray(px, value);
    }
    Ok(())
}

fn ensure_same_size(expected: &PixelBuffer, actual: &PixelBuffer) -> Result<(), PipelineError> {
    if expected.dimensions() == actual.dimensions() {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        })
    }
}
