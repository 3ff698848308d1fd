// Address translation - Linear raster offsets to Xenos tiled pixel indices
//
// The Xenos GPU stores render targets in 32×32 pixel macro tiles. Inside a
// tile, pixels are interleaved in 4×2 micro blocks, and every group of 8 rows
// has bit 5 of the in-tile offset flipped.

/// Tiling granularity in pixels (both axes)
pub const TILE_SIZE: u32 = 32;

/// Bytes per BGRA8 pixel
pub const BYTES_PER_PIXEL: u32 = 4;

/// Round a dimension up to the next multiple of the tile size
///
/// # Example
///
/// ```
/// use xenos_fb::detile::pad_to_tile;
///
/// assert_eq!(pad_to_tile(720), 736);
/// assert_eq!(pad_to_tile(1280), 1280);
/// ```
#[inline]
pub const fn pad_to_tile(n: u32) -> u32 {
    ((n + 31) >> 5) << 5
}

/// Map a byte offset in a row-major BGRA8 buffer to a tiled pixel index
///
/// # Arguments
/// * `padded_width` - Tile-padded row width in pixels (multiple of 32)
/// * `linear_byte_offset` - Byte offset into a row-major buffer of that width
///
/// # Returns
/// Pixel index (not byte offset) into the tiled buffer. Multiply by
/// [`BYTES_PER_PIXEL`] for a byte offset.
///
/// Offsets outside `[0, padded_width * padded_height * 4)` produce an
/// unspecified index.
#[inline]
pub const fn translate(padded_width: u32, linear_byte_offset: u32) -> u32 {
    let row_pitch = padded_width * BYTES_PER_PIXEL;
    let y = linear_byte_offset / row_pitch;
    let x = (linear_byte_offset % row_pitch) / BYTES_PER_PIXEL;
    tiled_pixel_index(padded_width, x, y)
}

/// Tiled pixel index for pixel coordinates `(x, y)`
///
/// Same mapping as [`translate`] without the byte offset decomposition.
#[inline]
pub const fn tiled_pixel_index(padded_width: u32, x: u32, y: u32) -> u32 {
    let macro_tile = (y & !31) * padded_width + (x & !31) * 32;
    let within_tile = (x & 3) + ((y & 1) << 2) + ((x & 28) << 1) + ((y & 30) << 5);
    let swizzle = (y & 8) << 2;
    macro_tile + (within_tile ^ swizzle)
}

/// Row-major byte offset of pixel `(x, y)` in a buffer `padded_width` pixels wide
#[inline]
pub const fn linear_byte_offset(padded_width: u32, x: u32, y: u32) -> u32 {
    (y * padded_width + x) * BYTES_PER_PIXEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to_tile() {
        assert_eq!(pad_to_tile(0), 0);
        assert_eq!(pad_to_tile(1), 32);
        assert_eq!(pad_to_tile(32), 32);
        assert_eq!(pad_to_tile(33), 64);
        assert_eq!(pad_to_tile(720), 736);
        assert_eq!(pad_to_tile(352), 352);
    }

    #[test]
    fn test_origin_maps_to_zero() {
        assert_eq!(translate(1280, 0), 0);
    }

    #[test]
    fn test_second_macro_tile() {
        // x = 32 is the first pixel of the second tile in row 0
        assert_eq!(translate(1280, 128), 1024);
    }

    #[test]
    fn test_second_tile_row() {
        // y = 32 starts a new row of macro tiles: 32 * 1280 pixels in
        assert_eq!(translate(1280, linear_byte_offset(1280, 0, 32)), 32 * 1280);
    }

    #[test]
    fn test_micro_block_layout() {
        // First 4×2 block occupies in-tile indices 0..8
        assert_eq!(tiled_pixel_index(64, 3, 0), 3);
        assert_eq!(tiled_pixel_index(64, 0, 1), 4);
        assert_eq!(tiled_pixel_index(64, 3, 1), 7);
        // x = 4 moves to the next block
        assert_eq!(tiled_pixel_index(64, 4, 0), 8);
    }

    #[test]
    fn test_swizzle_bit_flips_on_row_eight() {
        // y & 30 contributes 8 << 5 = 256, and y & 8 flips bit 5 (32)
        assert_eq!(tiled_pixel_index(64, 0, 8), 256 ^ 32);
        assert_eq!(tiled_pixel_index(64, 0, 16), 512);
    }

    #[test]
    fn test_translate_matches_coordinates() {
        for y in 0..64 {
            for x in 0..96 {
                assert_eq!(
                    translate(96, linear_byte_offset(96, x, y)),
                    tiled_pixel_index(96, x, y)
                );
            }
        }
    }

    #[test]
    fn test_single_tile_is_permutation() {
        let mut seen = [false; 32 * 32];
        for y in 0..32 {
            for x in 0..32 {
                let index = tiled_pixel_index(32, x, y) as usize;
                assert!(!seen[index], "index {} visited twice", index);
                seen[index] = true;
            }
        }
        assert!(seen.iter().all(|&v| v));
    }
}
