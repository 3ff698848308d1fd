// Test pattern - Synthetic tiled dumps with a known detiled image
//
// The pattern is drawn in linear space and scattered through the address
// translator, so a correct detiler reproduces pattern_color exactly.

use super::linear::{argb, ChannelOrder};
use super::tiled::TiledFramebuffer;
use crate::detile::{tiled_pixel_index, Resolution, BYTES_PER_PIXEL, TILE_SIZE};

/// Color of linear pixel `(x, y)` in a pattern of the given padded size
///
/// Red ramps horizontally, green ramps vertically, and blue alternates
/// per 32×32 tile so tile seams are visible.
pub fn pattern_color(x: u32, y: u32, padded: Resolution) -> u32 {
    let r = (x * 255 / padded.width.max(1)) as u8;
    let g = (y * 255 / padded.height.max(1)) as u8;
    let b = if ((x / TILE_SIZE) + (y / TILE_SIZE)) % 2 == 0 {
        0x40
    } else {
        0xC0
    };
    argb(0xFF, r, g, b)
}

/// Build a tiled dump whose detiled image is the test pattern
///
/// # Arguments
/// * `internal` - Source resolution (padded internally)
/// * `order` - Byte order to store each pixel in
pub fn tiled_test_pattern(internal: Resolution, order: ChannelOrder) -> TiledFramebuffer {
    let padded = internal.padded();
    let mut bytes = vec![0u8; padded.area() * BYTES_PER_PIXEL as usize];

    for y in 0..padded.height {
        for x in 0..padded.width {
            let index = tiled_pixel_index(padded.width, x, y) as usize * BYTES_PER_PIXEL as usize;
            bytes[index..index + 4].copy_from_slice(&order.encode(pattern_color(x, y, padded)));
        }
    }

    TiledFramebuffer::from_exact(padded, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_color_corners() {
        let padded = Resolution::new(64, 64);
        assert_eq!(pattern_color(0, 0, padded), 0xFF00_0040);
        assert_eq!(pattern_color(32, 0, padded) & 0xFF, 0xC0);
        assert_eq!(pattern_color(32, 32, padded) & 0xFF, 0x40);
    }

    #[test]
    fn test_pattern_is_stored_tiled() {
        let padded = Resolution::new(64, 32);
        let fb = tiled_test_pattern(padded, ChannelOrder::Bgra);

        // Linear pixel (32, 0) lives at tiled index 1024
        let word = fb.pixel_word(1024).unwrap();
        assert_eq!(
            ChannelOrder::Bgra.repack(word, false),
            pattern_color(32, 0, padded)
        );
    }
}
