// GPU converter - Runs the detile kernel headlessly and reads the image back
//
// Mostly used to check the kernel against the CPU converter and to export
// frames on machines where the CPU path is too slow.

use super::{ConvertError, FrameConverter};
use crate::detile::FrameGeometry;
use crate::framebuffer::{ChannelOrder, LinearFrame, TiledFramebuffer};
use crate::gpu::{read_image_words, DetileKernel, GpuContext, GpuError, KernelResources};
use log::debug;

/// Headless compute-kernel converter
pub struct GpuConverter {
    ctx: GpuContext,
    kernel: DetileKernel,
    resources: Option<KernelResources>,
    order: ChannelOrder,
    force_opaque: bool,
}

impl GpuConverter {
    /// Acquire a headless device and compile the kernel
    pub fn new(order: ChannelOrder, force_opaque: bool) -> Result<Self, GpuError> {
        let ctx = GpuContext::headless()?;
        let kernel = DetileKernel::new(&ctx)?;
        Ok(Self {
            ctx,
            kernel,
            resources: None,
            order,
            force_opaque,
        })
    }

    /// Run the kernel and return the image words without channel reordering
    pub fn convert_words(
        &mut self,
        tiled: &TiledFramebuffer,
        geometry: &FrameGeometry,
    ) -> Result<Vec<u32>, ConvertError> {
        super::check_source(tiled, geometry)?;

        let stale = self
            .resources
            .as_ref()
            .is_some_and(|res| res.geometry() != geometry);
        if stale {
            self.resources = None;
        }
        let resources = match &mut self.resources {
            Some(resources) => resources,
            slot => {
                debug!(
                    "Allocating kernel resources for {} -> {}",
                    geometry.internal(),
                    geometry.output()
                );
                slot.insert(KernelResources::new(&self.ctx, &self.kernel, *geometry)?)
            }
        };

        resources.upload(&self.ctx.queue, tiled.as_bytes())?;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("headless detile encoder"),
            });
        resources.record_dispatch(&mut encoder, &self.kernel, geometry.dispatch_grid());
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        Ok(read_image_words(&self.ctx, resources.output_image())?)
    }
}

impl FrameConverter for GpuConverter {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn convert(
        &mut self,
        tiled: &TiledFramebuffer,
        geometry: &FrameGeometry,
    ) -> Result<LinearFrame, ConvertError> {
        let mut words = self.convert_words(tiled, geometry)?;
        // Same reordering the sampling pass applies on screen
        for word in &mut words {
            *word = self.order.repack(*word, self.force_opaque);
        }
        Ok(LinearFrame::from_pixels(geometry.output(), words))
    }
}
