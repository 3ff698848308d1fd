// Display module - Presents converted dumps in a window
//
// This module provides:
// - FrameBackend: GPU operations a frame is built from
// - PresentationPipeline: per-frame Idle/Uploaded/Converted/Presented state machine
// - Renderer: wgpu implementation of FrameBackend
// - Viewer window with screenshot, reload and exit hotkeys

pub mod pipeline;
pub mod renderer;
pub mod window;

pub use pipeline::{FrameBackend, FrameState, PipelineError, PresentationPipeline};
pub use renderer::Renderer;
pub use window::{run_viewer, ViewerAction, ViewerError, ViewerWindow};
