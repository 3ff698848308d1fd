// Renderer - wgpu implementation of FrameBackend
//
// Owns the surface, device and every GPU object the viewer uses. They are
// created together in Renderer::new and released together on drop.

use super::pipeline::FrameBackend;
use crate::detile::FrameGeometry;
use crate::framebuffer::{ChannelOrder, LinearFrame};
use crate::gpu::{DetileKernel, GpuContext, GpuError, KernelResources, SampleParams, SamplePass};
use log::{debug, info, warn};
use std::sync::Arc;
use winit::window::Window;

/// Windowed renderer
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    ctx: GpuContext,
    kernel: DetileKernel,
    resources: KernelResources,
    sample: SamplePass,
    /// Decoding used for kernel output (raw dump words)
    dump_params: SampleParams,
    encoder: Option<wgpu::CommandEncoder>,
}

impl Renderer {
    /// Acquire a device for `window` and build all pipelines
    ///
    /// # Arguments
    /// * `window` - Target window; the surface keeps it alive
    /// * `geometry` - Sizes of the storage buffer and output image
    /// * `order` - Byte order of dumped pixels
    /// * `force_opaque` - Ignore dumped alpha
    /// * `vsync` - Wait for vertical blank when presenting
    ///
    /// # Errors
    /// Fails if no adapter can present to the window or if either shader
    /// fails validation.
    pub fn new(
        window: Arc<Window>,
        geometry: FrameGeometry,
        order: ChannelOrder,
        force_opaque: bool,
        vsync: bool,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let ctx = GpuContext::for_surface(instance, &surface)?;

        let caps = surface.get_capabilities(&ctx.adapter);
        // The sampling pass writes channel values as-is
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(GpuError::SurfaceUnsupported)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &surface_config);
        info!(
            "Surface {}x{} {:?} ({:?})",
            surface_config.width, surface_config.height, format, surface_config.present_mode
        );

        let kernel = DetileKernel::new(&ctx)?;
        let resources = KernelResources::new(&ctx, &kernel, geometry)?;
        let dump_params = SampleParams::new(order, force_opaque);
        let sample = SamplePass::new(&ctx, format, resources.output_view(), dump_params)?;

        Ok(Self {
            surface,
            surface_config,
            ctx,
            kernel,
            resources,
            sample,
            dump_params,
            encoder: None,
        })
    }

    /// Reconfigure the surface for a new window size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        debug!("Resizing surface to {}x{}", width, height);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.ctx.device, &self.surface_config);
    }

    fn acquire_frame(&mut self) -> Result<wgpu::SurfaceTexture, GpuError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface {}; reconfiguring", err);
                self.surface.configure(&self.ctx.device, &self.surface_config);
                Ok(self.surface.get_current_texture()?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl FrameBackend for Renderer {
    fn upload_buffer(&mut self, bytes: &[u8]) -> Result<(), GpuError> {
        self.resources.upload(&self.ctx.queue, bytes)
    }

    fn dispatch_kernel(&mut self, grid: (u32, u32)) -> Result<(), GpuError> {
        self.sample.set_params(&self.ctx.queue, self.dump_params);
        let encoder = self
            .encoder
            .get_or_insert_with(|| frame_encoder(&self.ctx.device));
        self.resources.record_dispatch(encoder, &self.kernel, grid);
        Ok(())
    }

    fn write_image(&mut self, frame: &LinearFrame) -> Result<(), GpuError> {
        let expected = self.resources.geometry().output();
        if frame.resolution() != expected {
            return Err(GpuError::UploadSize {
                expected: expected.area() as u64 * 4,
                actual: frame.as_bytes().len(),
            });
        }
        // LinearPixels are 0xAARRGGBB words: B, G, R, A in memory
        self.sample
            .set_params(&self.ctx.queue, SampleParams::new(ChannelOrder::Bgra, false));
        self.resources.write_image(&self.ctx.queue, frame.as_bytes());
        Ok(())
    }

    fn memory_barrier(&mut self) -> Result<(), GpuError> {
        // Writes from one submission are visible to every later one
        if let Some(encoder) = self.encoder.take() {
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
        }
        Ok(())
    }

    fn present_frame(&mut self) -> Result<(), GpuError> {
        let frame = self.acquire_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| frame_encoder(&self.ctx.device));
        self.sample.record(&mut encoder, &view);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn frame_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("frame encoder"),
    })
}
