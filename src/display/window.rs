// Window module - Viewer window and event loop
//
// This module provides window creation, hotkeys and the per-redraw frame
// loop, using winit and the wgpu Renderer.

use super::pipeline::{PipelineError, PresentationPipeline};
use super::renderer::Renderer;
use crate::config::ViewerConfig;
use crate::convert::CpuConverter;
use crate::detile::FrameGeometry;
use crate::framebuffer::{DumpSource, LoadError, TiledFramebuffer};
use crate::gpu::GpuError;
use crate::screenshot::save_screenshot;
use log::{error, info, warn};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Errors that end the viewer
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Hotkey actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    /// Save the current frame as PNG (F9)
    Screenshot,
    /// Re-read the dump (R)
    Reload,
    /// Close the viewer (Escape)
    Exit,
}

impl ViewerAction {
    /// Map a physical key to its action
    pub fn from_key(key: PhysicalKey) -> Option<Self> {
        match key {
            PhysicalKey::Code(KeyCode::F9) => Some(ViewerAction::Screenshot),
            PhysicalKey::Code(KeyCode::KeyR) => Some(ViewerAction::Reload),
            PhysicalKey::Code(KeyCode::Escape) => Some(ViewerAction::Exit),
            _ => None,
        }
    }
}

/// Display window for a tiled framebuffer dump
pub struct ViewerWindow {
    config: ViewerConfig,
    geometry: FrameGeometry,
    source: DumpSource,
    /// Dump loaded before the window existed, handed to the pipeline on resume
    initial: Option<TiledFramebuffer>,
    window: Option<Arc<Window>>,
    pipeline: Option<PresentationPipeline<Renderer>>,
    error: Option<ViewerError>,
}

impl ViewerWindow {
    /// Create a viewer (the window is created when the event loop starts)
    pub fn new(
        config: ViewerConfig,
        geometry: FrameGeometry,
        source: DumpSource,
        initial: TiledFramebuffer,
    ) -> Self {
        Self {
            config,
            geometry,
            source,
            initial: Some(initial),
            window: None,
            pipeline: None,
            error: None,
        }
    }

    /// Error that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<ViewerError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!("{}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_pipeline(
        &mut self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(Arc<Window>, PresentationPipeline<Renderer>), ViewerError> {
        let output = self.geometry.output();
        let window_attributes = Window::default_attributes()
            .with_title(format!(
                "xenos-fb - {} ({} -> {})",
                self.source,
                self.geometry.internal(),
                output
            ))
            .with_inner_size(PhysicalSize::new(output.width, output.height))
            .with_resizable(false);

        // Wrap window in Arc so the surface can hold it for 'static
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let dump = &self.config.dump;
        let renderer = Renderer::new(
            window.clone(),
            self.geometry,
            dump.channel_order,
            dump.force_opaque,
            self.config.video.vsync,
        )?;

        let initial = match self.initial.take() {
            Some(tiled) => tiled,
            None => self.source.load(&self.geometry)?,
        };
        let pipeline = PresentationPipeline::new(
            renderer,
            self.geometry,
            self.config.video.strategy,
            CpuConverter::new(dump.channel_order, dump.force_opaque),
            initial,
        )?;

        Ok((window, pipeline))
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: ViewerAction) {
        match action {
            ViewerAction::Screenshot => self.screenshot(),
            ViewerAction::Reload => self.reload(),
            ViewerAction::Exit => {
                info!("Escape pressed, exiting...");
                event_loop.exit();
            }
        }
    }

    fn screenshot(&self) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        let frame = match pipeline.snapshot() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Screenshot failed: {}", err);
                return;
            }
        };
        let shots = &self.config.screenshot;
        match save_screenshot(&frame, &shots.directory, shots.include_timestamp) {
            Ok(path) => info!("Screenshot saved to {}", path.display()),
            Err(err) => warn!("Screenshot failed: {}", err),
        }
    }

    fn reload(&mut self) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };
        info!("Reloading {}", self.source);
        let tiled = match self.source.load(&self.geometry) {
            Ok(tiled) => tiled,
            Err(err) => {
                warn!("Reload failed, keeping previous frame: {}", err);
                return;
            }
        };
        if let Err(err) = pipeline.replace_source(tiled) {
            warn!("Reload failed, keeping previous frame: {}", err);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };
        match pipeline.run_frame() {
            Ok(()) => {}
            Err(PipelineError::Backend(GpuError::Frame(wgpu::SurfaceError::Timeout))) => {
                warn!("Surface timed out, skipping frame");
            }
            Err(err) => self.fail(event_loop, err.into()),
        }
    }
}

impl ApplicationHandler for ViewerWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_pipeline(event_loop) {
            Ok((window, pipeline)) => {
                info!(
                    "Viewing {} at {} -> {} ({} conversion)",
                    self.source,
                    self.geometry.internal(),
                    self.geometry.output(),
                    pipeline.strategy()
                );
                window.request_redraw();
                self.window = Some(window);
                self.pipeline = Some(pipeline);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = ViewerAction::from_key(physical_key) {
                    self.handle_action(event_loop, action);
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(pipeline) = &mut self.pipeline {
                    pipeline.backend_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Request a redraw
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open the viewer and run until it is closed
///
/// # Arguments
/// * `config` - Validated configuration
/// * `geometry` - Geometry derived from `config`
/// * `source` - Where the dump comes from (also used by reload)
/// * `initial` - First dump, already loaded from `source`
pub fn run_viewer(
    config: ViewerConfig,
    geometry: FrameGeometry,
    source: DumpSource,
    initial: TiledFramebuffer,
) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;

    // Set control flow based on VSync setting
    if config.video.vsync {
        event_loop.set_control_flow(ControlFlow::Wait);
    } else {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    info!("Starting viewer...");
    info!("  Internal resolution: {}", geometry.internal());
    info!("  Output resolution: {}", geometry.output());
    info!("  Strategy: {}", config.video.strategy);
    info!("  VSync: {}", config.video.vsync);

    let mut viewer = ViewerWindow::new(config, geometry, source, initial);
    event_loop.run_app(&mut viewer)?;

    match viewer.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkeys() {
        assert_eq!(
            ViewerAction::from_key(PhysicalKey::Code(KeyCode::F9)),
            Some(ViewerAction::Screenshot)
        );
        assert_eq!(
            ViewerAction::from_key(PhysicalKey::Code(KeyCode::KeyR)),
            Some(ViewerAction::Reload)
        );
        assert_eq!(
            ViewerAction::from_key(PhysicalKey::Code(KeyCode::Escape)),
            Some(ViewerAction::Exit)
        );
        assert_eq!(ViewerAction::from_key(PhysicalKey::Code(KeyCode::Space)), None);
    }
}
