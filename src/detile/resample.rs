// Resampler - Nearest-neighbor mapping from output texels to source pixels
//
// Both resolutions are padded to the tile size before the scale is taken, so
// a 1280×720 source is addressed as 1280×736.

use super::address::pad_to_tile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A width × height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// This resolution with both axes rounded up to the tile size
    pub const fn padded(self) -> Self {
        Self {
            width: pad_to_tile(self.width),
            height: pad_to_tile(self.height),
        }
    }

    /// Number of pixels
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `(x, y)` lies inside this resolution
    #[inline]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error parsing a `WIDTHxHEIGHT` string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolution '{0}', expected WIDTHxHEIGHT")]
pub struct ParseResolutionError(String);

impl std::str::FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResolutionError(s.to_string());
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(err)?;
        let width = w.trim().parse().map_err(|_| err())?;
        let height = h.trim().parse().map_err(|_| err())?;
        Ok(Self::new(width, height))
    }
}

/// Source-per-output ratios, derived from padded resolutions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Compute the scale between two padded resolutions
    pub fn between(padded_internal: Resolution, padded_output: Resolution) -> Self {
        Self {
            x: padded_internal.width as f64 / padded_output.width as f64,
            y: padded_internal.height as f64 / padded_output.height as f64,
        }
    }
}

/// Map an output texel to the source pixel it samples
///
/// Truncating nearest neighbor: `floor(output * internal / output_extent)`
/// on each axis. The product is taken before the division so the result is
/// exact and matches the compute kernel bit for bit.
///
/// # Returns
/// `None` when `(output_x, output_y)` lies outside the padded output extent;
/// the destination texel is then left unwritten.
#[inline]
pub fn map_to_source(
    output_x: u32,
    output_y: u32,
    padded_output: Resolution,
    padded_internal: Resolution,
) -> Option<(u32, u32)> {
    if !padded_output.contains(output_x, output_y) {
        return None;
    }

    let source_x = output_x as u64 * padded_internal.width as u64 / padded_output.width as u64;
    let source_y = output_y as u64 * padded_internal.height as u64 / padded_output.height as u64;
    Some((source_x as u32, source_y as u32))
}
