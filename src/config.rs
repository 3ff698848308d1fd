// Configuration management
//
// Handles viewer configuration and settings persistence.

use crate::convert::ConversionStrategy;
use crate::detile::{FrameGeometry, GeometryError, Resolution};
use crate::framebuffer::{argb, ChannelOrder, DumpSource, LoadPolicy};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default configuration file path
pub const CONFIG_FILE: &str = "xenos_fb.toml";

/// Errors raised while reading, writing or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid video settings: {0}")]
    Invalid(#[from] GeometryError),
}

/// Viewer configuration
///
/// Stores all user-configurable settings for the viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Resolutions, presentation and conversion strategy
    pub video: VideoConfig,

    /// Dump file and how its pixels are decoded
    pub dump: DumpConfig,

    /// Screenshot settings
    pub screenshot: ScreenshotConfig,
}

/// Video configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Console render width
    pub internal_width: u32,

    /// Console render height
    pub internal_height: u32,

    /// Window width
    pub output_width: u32,

    /// Window height
    pub output_height: u32,

    /// Enable VSync
    pub vsync: bool,

    /// Where conversion runs
    pub strategy: ConversionStrategy,
}

/// Dump configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Tiled framebuffer dump to display
    pub path: PathBuf,

    /// How missing or short dumps are handled
    pub load_policy: LoadPolicy,

    /// Byte order of dumped pixels
    pub channel_order: ChannelOrder,

    /// Ignore dumped alpha
    pub force_opaque: bool,

    /// RGB of pixels a best-effort load could not read
    pub fill_color: [u8; 3],
}

/// Screenshot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Screenshot directory
    pub directory: PathBuf,

    /// Include timestamp in filename
    pub include_timestamp: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            internal_width: 1280,
            internal_height: 720,
            output_width: 1280,
            output_height: 720,
            vsync: true,
            strategy: ConversionStrategy::Gpu,
        }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig {
            path: PathBuf::from("fbmem.bin"),
            load_policy: LoadPolicy::Strict,
            channel_order: ChannelOrder::Brga,
            force_opaque: true,
            fill_color: [30, 30, 30],
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        ScreenshotConfig {
            directory: PathBuf::from("screenshots"),
            include_timestamp: true,
        }
    }
}

impl VideoConfig {
    pub fn internal_resolution(&self) -> Resolution {
        Resolution::new(self.internal_width, self.internal_height)
    }

    pub fn output_resolution(&self) -> Resolution {
        Resolution::new(self.output_width, self.output_height)
    }

    pub fn set_internal_resolution(&mut self, res: Resolution) {
        self.internal_width = res.width;
        self.internal_height = res.height;
    }

    pub fn set_output_resolution(&mut self, res: Resolution) {
        self.output_width = res.width;
        self.output_height = res.height;
    }
}

impl DumpConfig {
    /// Fill color as a LinearPixel (always opaque)
    pub fn fill_pixel(&self) -> u32 {
        let [r, g, b] = self.fill_color;
        argb(0xFF, r, g, b)
    }

    /// Fill color as dump bytes in the configured channel order
    pub fn fill_bytes(&self) -> [u8; 4] {
        self.channel_order.encode(self.fill_pixel())
    }

    /// Where frames come from: the configured file, or a synthetic pattern
    pub fn source(&self, test_pattern: bool) -> DumpSource {
        if test_pattern {
            DumpSource::TestPattern {
                order: self.channel_order,
            }
        } else {
            DumpSource::File {
                path: self.path.clone(),
                policy: self.load_policy,
                fill: self.fill_bytes(),
            }
        }
    }
}

impl ViewerConfig {
    /// Load configuration from file or create default
    ///
    /// A missing file is created with default settings. A file that fails to
    /// parse is left untouched and defaults are used for this run.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                // Try to save the default config, but don't fail if we can't
                match config.save(path) {
                    Ok(()) => info!("Wrote default configuration to {}", path.display()),
                    Err(err) => warn!("{}", err),
                }
                config
            }
            Err(err) => {
                warn!("{}; using defaults", err);
                Self::default()
            }
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the video resolutions
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry().map(|_| ())
    }

    /// Validated geometry for the configured resolutions
    pub fn geometry(&self) -> Result<FrameGeometry, ConfigError> {
        Ok(FrameGeometry::new(
            self.video.internal_resolution(),
            self.video.output_resolution(),
        )?)
    }
}
