// Tiled framebuffer - Owned, fixed-length copy of a Xenos framebuffer dump
//
// The length always equals padded_width * padded_height * 4. Constructors
// enforce this, and the buffer is never resized afterwards.

use super::loader::LoadError;
use crate::detile::{Resolution, BYTES_PER_PIXEL};

/// Raw BGRA8 pixels in tiled order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledFramebuffer {
    /// Padded source resolution the bytes are laid out for
    resolution: Resolution,
    bytes: Box<[u8]>,
}

impl TiledFramebuffer {
    /// Wrap dump bytes, rejecting any length other than the padded size
    ///
    /// # Arguments
    /// * `resolution` - Source resolution (padded internally)
    /// * `bytes` - Tiled pixel data
    pub fn from_bytes(resolution: Resolution, bytes: Vec<u8>) -> Result<Self, LoadError> {
        let resolution = resolution.padded();
        let expected = expected_len(resolution);
        if bytes.len() != expected {
            return Err(LoadError::SizeMismatch {
                path: None,
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            resolution,
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Create a buffer with every pixel set to the same four bytes
    pub fn filled(resolution: Resolution, pixel: [u8; 4]) -> Self {
        let resolution = resolution.padded();
        let bytes = pixel
            .iter()
            .copied()
            .cycle()
            .take(expected_len(resolution))
            .collect();
        Self::from_exact(resolution, bytes)
    }

    /// Wrap bytes already known to be the right length
    pub(super) fn from_exact(resolution: Resolution, bytes: Vec<u8>) -> Self {
        let resolution = resolution.padded();
        debug_assert_eq!(bytes.len(), expected_len(resolution));
        Self {
            resolution,
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Padded resolution of the dump
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte at `offset`, or `None` past the end
    #[inline]
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    /// The four bytes of tiled pixel `index`
    #[inline]
    pub fn pixel_bytes(&self, index: u32) -> Option<[u8; 4]> {
        let start = index as usize * BYTES_PER_PIXEL as usize;
        let chunk = self.bytes.get(start..start + BYTES_PER_PIXEL as usize)?;
        chunk.try_into().ok()
    }

    /// Tiled pixel `index` read as a little-endian word
    ///
    /// This is the value the compute kernel sees for the same index.
    #[inline]
    pub fn pixel_word(&self, index: u32) -> Option<u32> {
        self.pixel_bytes(index).map(u32::from_le_bytes)
    }
}

fn expected_len(padded: Resolution) -> usize {
    padded.area() * BYTES_PER_PIXEL as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_exact_length() {
        let fb = TiledFramebuffer::from_bytes(Resolution::new(32, 32), vec![0; 32 * 32 * 4])
            .expect("exact length");
        assert_eq!(fb.len(), 4096);
        assert_eq!(fb.resolution(), Resolution::new(32, 32));
    }

    #[test]
    fn test_from_bytes_pads_resolution() {
        // 20×10 pads to 32×32
        let fb = TiledFramebuffer::from_bytes(Resolution::new(20, 10), vec![0; 32 * 32 * 4]);
        assert!(fb.is_ok());
    }

    #[test]
    fn test_from_bytes_rejects_mismatch() {
        let err = TiledFramebuffer::from_bytes(Resolution::new(32, 32), vec![0; 100]).unwrap_err();
        match err {
            LoadError::SizeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 4096);
                assert_eq!(actual, 100);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_filled() {
        let fb = TiledFramebuffer::filled(Resolution::new(32, 32), [1, 2, 3, 4]);
        assert_eq!(fb.pixel_bytes(0), Some([1, 2, 3, 4]));
        assert_eq!(fb.pixel_bytes(1023), Some([1, 2, 3, 4]));
        assert_eq!(fb.pixel_word(5), Some(0x0403_0201));
    }

    #[test]
    fn test_accessors_are_bounds_checked() {
        let fb = TiledFramebuffer::filled(Resolution::new(32, 32), [0; 4]);
        assert_eq!(fb.pixel_bytes(1024), None);
        assert_eq!(fb.byte(4096), None);
        assert_eq!(fb.byte(4095), Some(0));
    }
}
