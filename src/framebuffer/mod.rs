// Framebuffer module - Source dumps and converted frames
//
// This module provides:
// - TiledFramebuffer: fixed-length tiled BGRA8 dump
// - Dump loading with strict or best-effort size handling
// - LinearFrame: row-major ARGB output
// - Channel order handling for dumped pixels
// - Synthetic tiled test patterns
// - Reloadable dump sources (file or test pattern)

pub mod linear;
pub mod loader;
pub mod pattern;
pub mod source;
pub mod tiled;

pub use linear::{argb, argb_to_rgba, ChannelOrder, LinearFrame};
pub use loader::{load_dump, LoadError, LoadPolicy};
pub use pattern::{pattern_color, tiled_test_pattern};
pub use source::DumpSource;
pub use tiled::TiledFramebuffer;
