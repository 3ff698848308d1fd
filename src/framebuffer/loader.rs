// Dump loader - Reads a tiled framebuffer dump from disk
//
// Two policies exist. Strict rejects anything but an exact-size file.
// BestEffort is for live capture directories: a missing or short file is
// only a warning, and pixels that were not read keep the fill color.

use super::tiled::TiledFramebuffer;
use crate::detile::FrameGeometry;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// How to treat dumps that are not exactly the expected size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Missing or wrongly sized files are errors
    #[default]
    Strict,
    /// Missing or short files are displayed over the fill color
    BestEffort,
}

/// Errors that can occur while loading a dump
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read
    #[error("failed to read dump '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data does not cover exactly the padded internal resolution
    #[error("dump{} is {actual} bytes, expected {expected}", display_path(.path))]
    SizeMismatch {
        path: Option<PathBuf>,
        expected: usize,
        actual: usize,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" '{}'", p.display()),
        None => String::new(),
    }
}

/// Load a dump for the given geometry
///
/// # Arguments
/// * `path` - Dump file
/// * `geometry` - Source/output resolutions; only the internal one matters here
/// * `policy` - Size handling policy
/// * `fill` - Pixel bytes for anything the file does not cover (best effort only)
///
/// # Returns
/// A framebuffer of exactly `geometry.tiled_len()` bytes
pub fn load_dump(
    path: impl AsRef<Path>,
    geometry: &FrameGeometry,
    policy: LoadPolicy,
    fill: [u8; 4],
) -> Result<TiledFramebuffer, LoadError> {
    let path = path.as_ref();
    let expected = geometry.tiled_len();

    let data = match read_at_most(path, expected + 1) {
        Ok(data) => data,
        Err(source) if policy == LoadPolicy::BestEffort => {
            warn!(
                "Failed to open framebuffer dump '{}': {}; showing fill color",
                path.display(),
                source
            );
            return Ok(TiledFramebuffer::filled(geometry.internal(), fill));
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if data.len() > expected || (data.len() < expected && policy == LoadPolicy::Strict) {
        let actual = if data.len() > expected {
            file_len(path).unwrap_or(data.len())
        } else {
            data.len()
        };
        return Err(LoadError::SizeMismatch {
            path: Some(path.to_path_buf()),
            expected,
            actual,
        });
    }

    if data.len() < expected {
        warn!(
            "Framebuffer dump '{}' is short ({} of {} bytes); remaining pixels keep the fill color",
            path.display(),
            data.len(),
            expected
        );
        let mut bytes = TiledFramebuffer::filled(geometry.internal(), fill)
            .as_bytes()
            .to_vec();
        bytes[..data.len()].copy_from_slice(&data);
        return TiledFramebuffer::from_bytes(geometry.internal(), bytes);
    }

    info!("Loaded framebuffer dump '{}' ({} bytes)", path.display(), expected);
    TiledFramebuffer::from_bytes(geometry.internal(), data)
}

/// Read up to `limit` bytes from the start of a file
fn read_at_most(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut data = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut data)?;
    Ok(data)
}

fn file_len(path: &Path) -> Option<usize> {
    std::fs::metadata(path).ok().map(|m| m.len() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detile::Resolution;
    use std::fs;

    const FILL: [u8; 4] = [30, 30, 30, 0xFF];

    fn geometry() -> FrameGeometry {
        FrameGeometry::unscaled(Resolution::new(32, 32)).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("xenos_fb_loader_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_load_exact_size() {
        let path = temp_path("exact.bin");
        let bytes: Vec<u8> = (0..4096).map(|i| i as u8).collect();
        fs::write(&path, &bytes).unwrap();

        let fb = load_dump(&path, &geometry(), LoadPolicy::Strict, FILL).unwrap();
        assert_eq!(fb.as_bytes(), &bytes[..]);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_strict_rejects_short_file() {
        let path = temp_path("short_strict.bin");
        fs::write(&path, [0u8; 100]).unwrap();

        let err = load_dump(&path, &geometry(), LoadPolicy::Strict, FILL).unwrap_err();
        assert!(matches!(
            err,
            LoadError::SizeMismatch {
                expected: 4096,
                actual: 100,
                ..
            }
        ));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_strict_rejects_missing_file() {
        let err = load_dump(
            temp_path("does_not_exist.bin"),
            &geometry(),
            LoadPolicy::Strict,
            FILL,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_oversized_rejected_under_both_policies() {
        let path = temp_path("oversized.bin");
        fs::write(&path, vec![0u8; 5000]).unwrap();

        for policy in [LoadPolicy::Strict, LoadPolicy::BestEffort] {
            let err = load_dump(&path, &geometry(), policy, FILL).unwrap_err();
            assert!(matches!(
                err,
                LoadError::SizeMismatch { actual: 5000, .. }
            ));
        }

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_best_effort_short_file_keeps_fill() {
        let path = temp_path("short_best_effort.bin");
        fs::write(&path, [9u8; 8]).unwrap();

        let fb = load_dump(&path, &geometry(), LoadPolicy::BestEffort, FILL).unwrap();
        assert_eq!(fb.len(), 4096);
        assert_eq!(fb.pixel_bytes(0), Some([9; 4]));
        assert_eq!(fb.pixel_bytes(1), Some([9; 4]));
        assert_eq!(fb.pixel_bytes(2), Some(FILL));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_best_effort_missing_file_is_fill() {
        let fb = load_dump(
            temp_path("missing_best_effort.bin"),
            &geometry(),
            LoadPolicy::BestEffort,
            FILL,
        )
        .unwrap();
        assert!(fb.as_bytes().chunks(4).all(|px| px == FILL));
    }

    #[test]
    fn test_error_messages() {
        let err = LoadError::SizeMismatch {
            path: None,
            expected: 8,
            actual: 4,
        };
        assert_eq!(err.to_string(), "dump is 4 bytes, expected 8");

        let err = LoadError::SizeMismatch {
            path: Some(PathBuf::from("fbmem.bin")),
            expected: 8,
            actual: 4,
        };
        assert_eq!(err.to_string(), "dump 'fbmem.bin' is 4 bytes, expected 8");
    }
}
