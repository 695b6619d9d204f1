//! Levels adjustment: white-point clip plus contrast stretch.
//!
//! Values brighter than the white-point level become pure white, which
//! erases faint background shading. Everything else is stretched from
//! `[0, level]` onto `[0, 240]`.

use crate::types::{CHANNELS, PixelBuffer, fill_opaque_gray, quantize};

/// Lowest white point (keeps nearly everything).
pub const MIN_WHITE_POINT: f64 = 0.0;
/// Highest white point (clips everything above 105).
pub const MAX_WHITE_POINT: f64 = 100.0;
/// Level drop per white-point unit.
pub const LEVEL_PER_WHITE_POINT: f64 = 1.5;
/// Upper bound of the contrast stretch.
pub const STRETCH_CEILING: f64 = 240.0;

/// Threshold level for a white point: `255 - white_point * 1.5`, with
/// `white_point` clamped to `[0, 100]` (NaN counts as 0).
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn white_level(white_point: f64) -> f64 {
    let white_point = if white_point.is_nan() {
        MIN_WHITE_POINT
    } else {
        white_point.clamp(MIN_WHITE_POINT, MAX_WHITE_POINT)
    };
    // Not `mul_add`: the product must round before the subtraction.
    255.0 - white_point * LEVEL_PER_WHITE_POINT
}

/// Apply the levels mapping to a single value.
#[must_use]
pub fn level_value(value: u8, level: f64) -> u8 {
    let v = f64::from(value);
    if v > level {
        u8::MAX
    } else {
        quantize(v / level * STRETCH_CEILING)
    }
}

/// Apply levels to `buffer` in place.
///
/// The R channel is sampled (the buffer is expected to be gray); the
/// result is written to R, G and B and alpha is forced to 255.
pub fn apply_levels(buffer: &mut PixelBuffer, white_point: f64) {
    let level = white_level(white_point);
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let value = level_value(px[0], level);
        fill_opaque_gray(px, value);
    }
}
