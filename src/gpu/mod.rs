// GPU module - wgpu plumbing for the detile kernel and the sampling pass
//
// This module provides:
// - Device acquisition (windowed or headless)
// - The detile compute kernel and its buffers
// - The full-screen sampling pass
// - Image readback for headless conversion

pub mod context;
pub mod kernel;
pub mod readback;
pub mod sample;

pub use context::GpuContext;
pub use kernel::{
    check_storage_limits, DetileKernel, KernelParams, KernelResources, DETILE_KERNEL_SOURCE,
};
pub use readback::read_image_words;
pub use sample::{SampleParams, SamplePass, SAMPLE_SHADER_SOURCE};

/// Errors raised by GPU setup and submission
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface is not supported by the selected adapter")]
    SurfaceUnsupported,

    /// WGSL compilation, pipeline or resource validation failed
    #[error("{label} failed validation: {message}")]
    Shader {
        label: &'static str,
        message: String,
    },

    #[error("{what} needs {size}, device allows {limit}")]
    TooLarge {
        what: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("dump upload is {actual} bytes, GPU buffer holds {expected}")]
    UploadSize { expected: u64, actual: usize },

    #[error("failed to acquire surface texture: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("readback mapping was abandoned")]
    MapAborted,

    #[error("device poll failed: {0}")]
    Poll(String),
}

/// Parse and validate WGSL without a device
#[cfg(test)]
pub(crate) fn validate_wgsl(label: &str, source: &str) -> wgpu::naga::Module {
    use wgpu::naga;

    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|err| panic!("{label} WGSL parse failed: {err}"));
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .unwrap_or_else(|err| panic!("{label} WGSL validation failed: {err:?}"));
    module
}
