// Convert module - Tiled dump to LinearFrame conversion strategies
//
// This module provides:
// - FrameConverter: common interface of every strategy
// - CpuConverter: sequential reference implementation
// - GpuConverter: headless compute kernel with readback
// - ConversionStrategy: which path the viewer drives

pub mod cpu;
pub mod gpu;

pub use cpu::CpuConverter;
pub use gpu::GpuConverter;

use crate::detile::{FrameGeometry, Resolution};
use crate::framebuffer::{LinearFrame, TiledFramebuffer};
use crate::gpu::GpuError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while converting a frame
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("dump is laid out for {actual}, geometry expects {expected}")]
    SourceMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    #[error("tiled pixel index {index} is outside the dump")]
    AddressOutOfRange { index: u32 },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Turns a tiled dump into a row-major frame
pub trait FrameConverter {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Convert one dump at the given geometry
    ///
    /// The returned frame has the geometry's logical output resolution.
    fn convert(
        &mut self,
        tiled: &TiledFramebuffer,
        geometry: &FrameGeometry,
    ) -> Result<LinearFrame, ConvertError>;
}

/// Where conversion runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStrategy {
    /// CpuConverter, then upload of the finished frame
    Cpu,
    /// Detile kernel dispatched on the presenting device
    #[default]
    Gpu,
}

impl fmt::Display for ConversionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionStrategy::Cpu => write!(f, "cpu"),
            ConversionStrategy::Gpu => write!(f, "gpu"),
        }
    }
}

impl FromStr for ConversionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(ConversionStrategy::Cpu),
            "gpu" => Ok(ConversionStrategy::Gpu),
            other => Err(format!("unknown strategy '{other}' (expected cpu or gpu)")),
        }
    }
}

/// Reject dumps laid out for a different padded source size
pub(crate) fn check_source(
    tiled: &TiledFramebuffer,
    geometry: &FrameGeometry,
) -> Result<(), ConvertError> {
    let expected = geometry.padded_internal();
    if tiled.resolution() != expected {
        return Err(ConvertError::SourceMismatch {
            expected,
            actual: tiled.resolution(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("cpu".parse(), Ok(ConversionStrategy::Cpu));
        assert_eq!("GPU".parse(), Ok(ConversionStrategy::Gpu));
        assert!("vulkan".parse::<ConversionStrategy>().is_err());
    }

    #[test]
    fn test_strategy_default_is_gpu() {
        assert_eq!(ConversionStrategy::default(), ConversionStrategy::Gpu);
        assert_eq!(ConversionStrategy::Gpu.to_string(), "gpu");
    }

    #[test]
    fn test_source_check_uses_padded_size() {
        // 1280x720 dumps are stored as 1280x736
        let tiled = TiledFramebuffer::filled(Resolution::new(1280, 736), [0; 4]);
        let geometry = FrameGeometry::unscaled(Resolution::new(1280, 720)).unwrap();
        assert!(check_source(&tiled, &geometry).is_ok());
    }
}
