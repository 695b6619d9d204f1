//! Luminance reduction.
//!
//! First stage of the pipeline: every pixel's R, G and B are replaced by
//! its Rec. 601 luma `0.299*R + 0.587*G + 0.114*B`. Alpha is left alone.

use crate::types::{CHANNELS, PixelBuffer, fill_rgb, quantize};

/// Rec. 601 luma of one RGB triple, rounded to a byte.
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    quantize(0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b))
}

/// Convert `buffer` to grayscale in place.
pub fn to_grayscale(buffer: &mut PixelBuffer) {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let luma = luminance(px[0], px[1], px[2]);
        fill_rgb(px, luma);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn primaries_use_weighted_luma() {
        // 76.245, 149.685, 29.07
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn gray_input_is_unchanged() {
        for v in [0u8, 1, 64, 128, 200, 254, 255] {
            assert_eq!(luminance(v, v, v), v, "gray level {v}");
        }
    }

    #[test]
    #[allow(clippy::suboptimal_flops)]
    fn every_pixel_gets_equal_channels_holding_luma() {
        let buf = PixelBuffer::from_fn(16, 16, |x, y| {
            let x = u8::try_from(x).unwrap();
            let y = u8::try_from(y).unwrap();
            [x * 16, y * 15, x.wrapping_mul(y), 255]
        })
        .unwrap();
        let mut gray = buf.clone();
        to_grayscale(&mut gray);

        for (src, out) in buf.pixels().zip(gray.pixels()) {
            let expected = (0.299 * f64::from(src[0])
                + 0.587 * f64::from(src[1])
                + 0.114 * f64::from(src[2]))
            .round_ties_even();
            assert_eq!(out[0], out[1]);
            assert_eq!(out[1], out[2]);
            assert!((f64::from(out[0]) - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn alpha_is_untouched() {
        let mut buf = PixelBuffer::from_pixel(3, 3, [10, 200, 30, 77]).unwrap();
        to_grayscale(&mut buf);
        assert!(buf.pixels().all(|px| px[3] == 77));
    }
}
