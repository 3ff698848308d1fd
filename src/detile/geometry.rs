// Frame geometry - The internal/output resolution pair and everything derived from it

use super::address::BYTES_PER_PIXEL;
use super::resample::{Resolution, ScaleFactors};

/// Compute workgroup edge length (threads per axis)
pub const WORKGROUP_SIZE: u32 = 16;

/// Largest accepted width or height, before padding
pub const MAX_DIMENSION: u32 = 8192;

/// Invalid resolution pair
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("{which} resolution {res} has a zero dimension")]
    ZeroDimension { which: &'static str, res: Resolution },

    #[error("{which} resolution {res} exceeds the {max}x{max} limit")]
    TooLarge {
        which: &'static str,
        res: Resolution,
        max: u32,
    },
}

/// Source and display resolutions of a conversion
///
/// Scale factors, padded sizes and dispatch extents are always derived
/// from the two stored resolutions, so they cannot go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    internal: Resolution,
    output: Resolution,
}

impl FrameGeometry {
    /// Create a validated geometry
    ///
    /// # Arguments
    /// * `internal` - Console (source) resolution
    /// * `output` - Display resolution
    pub fn new(internal: Resolution, output: Resolution) -> Result<Self, GeometryError> {
        check("internal", internal)?;
        check("output", output)?;
        Ok(Self { internal, output })
    }

    /// Geometry with no scaling
    pub fn unscaled(resolution: Resolution) -> Result<Self, GeometryError> {
        Self::new(resolution, resolution)
    }

    pub fn internal(&self) -> Resolution {
        self.internal
    }

    pub fn output(&self) -> Resolution {
        self.output
    }

    pub fn padded_internal(&self) -> Resolution {
        self.internal.padded()
    }

    pub fn padded_output(&self) -> Resolution {
        self.output.padded()
    }

    /// Source pixels per output texel on each axis
    pub fn scale(&self) -> ScaleFactors {
        ScaleFactors::between(self.padded_internal(), self.padded_output())
    }

    /// Exact byte length a tiled dump must have
    pub fn tiled_len(&self) -> usize {
        self.padded_internal().area() * BYTES_PER_PIXEL as usize
    }

    /// Workgroup counts covering the padded output in 16×16 blocks
    pub fn dispatch_grid(&self) -> (u32, u32) {
        let padded = self.padded_output();
        (
            padded.width.div_ceil(WORKGROUP_SIZE),
            padded.height.div_ceil(WORKGROUP_SIZE),
        )
    }
}

fn check(which: &'static str, res: Resolution) -> Result<(), GeometryError> {
    if res.width == 0 || res.height == 0 {
        return Err(GeometryError::ZeroDimension { which, res });
    }
    if res.width > MAX_DIMENSION || res.height > MAX_DIMENSION {
        return Err(GeometryError::TooLarge {
            which,
            res,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}
