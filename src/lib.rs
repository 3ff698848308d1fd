// Xenos Framebuffer Viewer Library
// Detiles Xbox 360 framebuffer dumps on the CPU or GPU and presents them

// Public modules
pub mod config;
pub mod convert;
pub mod detile;
pub mod display;
pub mod framebuffer;
pub mod gpu;
pub mod screenshot;

// Re-export main types for convenience
pub use config::{ConfigError, ViewerConfig};
pub use convert::{ConversionStrategy, ConvertError, CpuConverter, FrameConverter, GpuConverter};
pub use detile::{translate, FrameGeometry, GeometryError, Resolution};
pub use display::{FrameBackend, PresentationPipeline, Renderer};
pub use framebuffer::{
    load_dump, ChannelOrder, DumpSource, LinearFrame, LoadError, LoadPolicy, TiledFramebuffer,
};
pub use gpu::GpuError;
pub use screenshot::{save_png, save_screenshot, ScreenshotError};
