// Dump source - Where the viewer gets its tiled framebuffer from

use super::linear::ChannelOrder;
use super::loader::{load_dump, LoadError, LoadPolicy};
use super::pattern::tiled_test_pattern;
use super::tiled::TiledFramebuffer;
use crate::detile::FrameGeometry;
use std::fmt;
use std::path::PathBuf;

/// A reloadable origin of tiled dumps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpSource {
    /// Capture file on disk
    File {
        path: PathBuf,
        policy: LoadPolicy,
        /// Dump bytes for pixels a best-effort load could not read
        fill: [u8; 4],
    },
    /// Synthetic pattern stored in the given byte order
    TestPattern { order: ChannelOrder },
}

impl DumpSource {
    /// Produce a fresh framebuffer laid out for `geometry`
    pub fn load(&self, geometry: &FrameGeometry) -> Result<TiledFramebuffer, LoadError> {
        match self {
            DumpSource::File { path, policy, fill } => load_dump(path, geometry, *policy, *fill),
            DumpSource::TestPattern { order } => Ok(tiled_test_pattern(geometry.internal(), *order)),
        }
    }
}

impl fmt::Display for DumpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpSource::File { path, .. } => write!(f, "{}", path.display()),
            DumpSource::TestPattern { .. } => write!(f, "test pattern"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detile::Resolution;

    #[test]
    fn test_pattern_source_matches_geometry() {
        let geometry = FrameGeometry::unscaled(Resolution::new(100, 50)).unwrap();
        let source = DumpSource::TestPattern {
            order: ChannelOrder::Brga,
        };
        let tiled = source.load(&geometry).unwrap();
        assert_eq!(tiled.resolution(), Resolution::new(128, 64));
        assert_eq!(source.to_string(), "test pattern");
    }

    #[test]
    fn test_missing_file_source() {
        let geometry = FrameGeometry::unscaled(Resolution::new(64, 64)).unwrap();
        let path = std::env::temp_dir().join("xenos_fb_source_missing.bin");
        let strict = DumpSource::File {
            path: path.clone(),
            policy: LoadPolicy::Strict,
            fill: [0; 4],
        };
        assert!(matches!(strict.load(&geometry), Err(LoadError::Io { .. })));

        let best_effort = DumpSource::File {
            path,
            policy: LoadPolicy::BestEffort,
            fill: [1, 2, 3, 4],
        };
        let tiled = best_effort.load(&geometry).unwrap();
        assert_eq!(tiled.pixel_bytes(0), Some([1, 2, 3, 4]));
    }
}
