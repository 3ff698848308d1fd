// Linear frame - Row-major ARGB output of a conversion
//
// Every converter produces LinearPixels packed as 0xAARRGGBB. How the four
// bytes of a dumped pixel map onto those channels is described by
// ChannelOrder.

use crate::detile::Resolution;
use serde::{Deserialize, Serialize};

/// Pack channels into a LinearPixel (0xAARRGGBB)
#[inline]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split a LinearPixel into `[r, g, b, a]`
#[inline]
pub const fn argb_to_rgba(pixel: u32) -> [u8; 4] {
    [
        (pixel >> 16) as u8, // Red
        (pixel >> 8) as u8,  // Green
        pixel as u8,         // Blue
        (pixel >> 24) as u8, // Alpha
    ]
}

/// Byte order of one pixel inside a tiled dump
///
/// Names list the channel stored at byte offsets +0, +1, +2, +3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// B, R, G, A: default decoding for captured dumps
    #[default]
    Brga,
    /// B, G, R, A: conventional little-endian BGRA8
    Bgra,
    /// A, R, G, B: big-endian 0xAARRGGBB words
    Argb,
}

impl ChannelOrder {
    /// Convert a raw little-endian pixel word into a LinearPixel
    ///
    /// # Arguments
    /// * `word` - The four dump bytes read as a little-endian `u32`
    /// * `force_opaque` - Replace the stored alpha with 0xFF
    #[inline]
    pub const fn repack(self, word: u32, force_opaque: bool) -> u32 {
        let b0 = word as u8;
        let b1 = (word >> 8) as u8;
        let b2 = (word >> 16) as u8;
        let b3 = (word >> 24) as u8;

        let (a, r, g, b) = match self {
            ChannelOrder::Brga => (b3, b1, b2, b0),
            ChannelOrder::Bgra => (b3, b2, b1, b0),
            ChannelOrder::Argb => (b0, b1, b2, b3),
        };

        argb(if force_opaque { 0xFF } else { a }, r, g, b)
    }

    /// Dump bytes that decode back to `pixel`
    pub const fn encode(self, pixel: u32) -> [u8; 4] {
        let [r, g, b, a] = argb_to_rgba(pixel);
        match self {
            ChannelOrder::Brga => [b, r, g, a],
            ChannelOrder::Bgra => [b, g, r, a],
            ChannelOrder::Argb => [a, r, g, b],
        }
    }

    /// Selector passed to the sampling shader
    pub const fn shader_code(self) -> u32 {
        match self {
            ChannelOrder::Brga => 0,
            ChannelOrder::Bgra => 1,
            ChannelOrder::Argb => 2,
        }
    }
}

/// Converted frame in display resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearFrame {
    resolution: Resolution,
    pixels: Vec<u32>,
}

impl LinearFrame {
    /// Create a frame filled with one LinearPixel
    pub fn new(resolution: Resolution, fill: u32) -> Self {
        Self {
            resolution,
            pixels: vec![fill; resolution.area()],
        }
    }

    /// Wrap existing row-major pixels
    ///
    /// # Panics
    /// Panics if `pixels.len()` does not match the resolution
    pub fn from_pixels(resolution: Resolution, pixels: Vec<u32>) -> Self {
        assert_eq!(
            pixels.len(),
            resolution.area(),
            "pixel count does not match {}",
            resolution
        );
        Self { resolution, pixels }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Pixel at `(x, y)`, or `None` outside the frame
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrite the pixel at `(x, y)`
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) {
        let index = self
            .index(x, y)
            .unwrap_or_else(|| panic!("({}, {}) out of bounds for {}", x, y, self.resolution));
        self.pixels[index] = pixel;
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixels as native-endian bytes, for texture uploads
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Convert to tightly packed RGBA8
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for &pixel in &self.pixels {
            rgba.extend_from_slice(&argb_to_rgba(pixel));
        }
        rgba
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        self.resolution
            .contains(x, y)
            .then(|| y as usize * self.resolution.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_packing() {
        assert_eq!(argb(0xFF, 0x12, 0x34, 0x56), 0xFF12_3456);
        assert_eq!(argb_to_rgba(0xFF12_3456), [0x12, 0x34, 0x56, 0xFF]);
    }

    #[test]
    fn test_brga_order_repack() {
        // Bytes B=0x10 R=0x20 G=0x30 A=0x40
        let word = u32::from_le_bytes([0x10, 0x20, 0x30, 0x40]);
        assert_eq!(ChannelOrder::Brga.repack(word, false), 0x4020_3010);
        assert_eq!(ChannelOrder::Brga.repack(word, true), 0xFF20_3010);
    }

    #[test]
    fn test_bgra_and_argb_repack() {
        let word = u32::from_le_bytes([0x10, 0x20, 0x30, 0x40]);
        assert_eq!(ChannelOrder::Bgra.repack(word, false), 0x4030_2010);
        assert_eq!(ChannelOrder::Argb.repack(word, false), 0x1020_3040);
    }

    #[test]
    fn test_encode_inverts_repack() {
        let pixel = argb(0x80, 0x1E, 0x2E, 0x3E);
        for order in [ChannelOrder::Brga, ChannelOrder::Bgra, ChannelOrder::Argb] {
            let word = u32::from_le_bytes(order.encode(pixel));
            assert_eq!(order.repack(word, false), pixel, "{:?}", order);
        }
    }

    #[test]
    fn test_frame_get_set() {
        let mut frame = LinearFrame::new(Resolution::new(4, 3), 0);
        frame.set(3, 2, 0xFFAA_BBCC);
        assert_eq!(frame.get(3, 2), Some(0xFFAA_BBCC));
        assert_eq!(frame.as_slice()[11], 0xFFAA_BBCC);
        assert_eq!(frame.get(4, 0), None);
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_bounds() {
        let mut frame = LinearFrame::new(Resolution::new(4, 3), 0);
        frame.set(0, 3, 0);
    }

    #[test]
    fn test_to_rgba() {
        let frame = LinearFrame::new(Resolution::new(2, 1), argb(0xFF, 30, 40, 50));
        assert_eq!(frame.to_rgba(), vec![30, 40, 50, 0xFF, 30, 40, 50, 0xFF]);
    }
}
