// Detile module - Address math shared by the CPU converter and the GPU kernel
//
// This module provides:
// - Tile padding (32-pixel granularity)
// - Linear-to-tiled address translation
// - Nearest-neighbor output-to-source resampling
// - Frame geometry (padded sizes, scale factors, dispatch grid)

pub mod address;
pub mod geometry;
pub mod resample;

pub use address::{
    linear_byte_offset, pad_to_tile, tiled_pixel_index, translate, BYTES_PER_PIXEL, TILE_SIZE,
};
pub use geometry::{FrameGeometry, GeometryError, MAX_DIMENSION, WORKGROUP_SIZE};
pub use resample::{map_to_source, ParseResolutionError, Resolution, ScaleFactors};
