//! Photographic negative of the color channels.

use crate::types::{CHANNELS, PixelBuffer};

/// Replace every R, G and B value `v` with `255 - v`. Alpha is kept.
///
/// Applying this twice restores the original buffer exactly.
pub fn invert(buffer: &mut PixelBuffer) {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        for v in &mut px[..3] {
            *v = u8::MAX - *v;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inverts_color_channels_only() {
        let mut buf = PixelBuffer::from_pixel(2, 2, [0, 100, 255, 42]).unwrap();
        invert(&mut buf);
        assert!(buf.pixels().all(|px| px == [255, 155, 0, 42]));
    }

    #[test]
    fn double_inversion_is_identity() {
        // Cover every byte value in every channel position.
        let buf = PixelBuffer::from_fn(256, 1, |x, _| {
            let v = u8::try_from(x).unwrap();
            [v, v.wrapping_add(85), v.wrapping_add(170), v]
        })
        .unwrap();
        let mut twice = buf.clone();
        invert(&mut twice);
        assert_ne!(twice, buf);
        invert(&mut twice);
        assert_eq!(twice, buf);
    }
}
