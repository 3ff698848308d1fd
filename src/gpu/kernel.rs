// Detile kernel - Compute pipeline and the per-geometry resources it runs on
//
// The tiled dump is bound as a read-only storage buffer of u32 words and the
// result lands in an r32uint storage texture of the logical output size.

use super::context::GpuContext;
use super::GpuError;
use crate::detile::FrameGeometry;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// WGSL source of the detile compute kernel
pub const DETILE_KERNEL_SOURCE: &str = include_str!("shaders/detile.wgsl");

/// Format of the detiled image: one packed dump word per texel
pub const OUTPUT_IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// Uniform block matching `Params` in the kernel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct KernelParams {
    pub padded_internal: [u32; 2],
    pub padded_output: [u32; 2],
    pub output: [u32; 2],
    pub _pad: [u32; 2],
}

impl KernelParams {
    pub fn from_geometry(geometry: &FrameGeometry) -> Self {
        let padded_internal = geometry.padded_internal();
        let padded_output = geometry.padded_output();
        let output = geometry.output();
        Self {
            padded_internal: [padded_internal.width, padded_internal.height],
            padded_output: [padded_output.width, padded_output.height],
            output: [output.width, output.height],
            _pad: [0; 2],
        }
    }
}

/// Compiled detile pipeline
pub struct DetileKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DetileKernel {
    /// Compile the kernel
    ///
    /// # Errors
    /// Returns [`GpuError::Shader`] if the WGSL fails to compile or the
    /// pipeline fails validation.
    pub fn new(ctx: &GpuContext) -> Result<Self, GpuError> {
        ctx.validated("detile kernel", |device| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("detile kernel"),
                source: wgpu::ShaderSource::Wgsl(DETILE_KERNEL_SOURCE.into()),
            });

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("detile bind group layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::StorageTexture {
                                access: wgpu::StorageTextureAccess::WriteOnly,
                                format: OUTPUT_IMAGE_FORMAT,
                                view_dimension: wgpu::TextureViewDimension::D2,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("detile pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("detile pipeline"),
                layout: Some(&layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

            Self {
                pipeline,
                bind_group_layout,
            }
        })
    }
}

/// Buffers and image sized for one geometry
pub struct KernelResources {
    geometry: FrameGeometry,
    tiled: wgpu::Buffer,
    output_image: wgpu::Texture,
    output_view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl KernelResources {
    /// Allocate the dump buffer, output image and bind group for `geometry`
    ///
    /// # Errors
    /// Returns [`GpuError::TooLarge`] if the dump does not fit the device's
    /// storage limits, or [`GpuError::Shader`] if resource creation fails
    /// validation.
    pub fn new(
        ctx: &GpuContext,
        kernel: &DetileKernel,
        geometry: FrameGeometry,
    ) -> Result<Self, GpuError> {
        check_storage_limits(&geometry, &ctx.device.limits())?;

        ctx.validated("detile resources", |device| {
            let tiled = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tiled framebuffer"),
                size: geometry.tiled_len() as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let output = geometry.output();
            let output_image = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("detiled image"),
                size: wgpu::Extent3d {
                    width: output.width,
                    height: output.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: OUTPUT_IMAGE_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let output_view = output_image.create_view(&wgpu::TextureViewDescriptor::default());

            let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("detile params"),
                contents: bytemuck::bytes_of(&KernelParams::from_geometry(&geometry)),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("detile bind group"),
                layout: &kernel.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: tiled.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&output_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params.as_entire_binding(),
                    },
                ],
            });

            Self {
                geometry,
                tiled,
                output_image,
                output_view,
                bind_group,
            }
        })
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn output_image(&self) -> &wgpu::Texture {
        &self.output_image
    }

    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.output_view
    }

    /// Copy a whole dump into the storage buffer
    ///
    /// # Errors
    /// Returns [`GpuError::UploadSize`] if `bytes` does not match the buffer.
    pub fn upload(&self, queue: &wgpu::Queue, bytes: &[u8]) -> Result<(), GpuError> {
        if bytes.len() as u64 != self.tiled.size() {
            return Err(GpuError::UploadSize {
                expected: self.tiled.size(),
                actual: bytes.len(),
            });
        }
        queue.write_buffer(&self.tiled, 0, bytes);
        Ok(())
    }

    /// Write already converted pixels straight into the output image
    pub fn write_image(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        let output = self.geometry.output();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.output_image,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(output.width * 4),
                rows_per_image: Some(output.height),
            },
            self.output_image.size(),
        );
    }

    /// Record one dispatch of the kernel over `grid` workgroups
    pub fn record_dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kernel: &DetileKernel,
        grid: (u32, u32),
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("detile pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&kernel.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(grid.0, grid.1, 1);
    }
}

/// Check that a geometry's dump buffer and output image fit `limits`
///
/// wgpu reports oversized resources as uncaptured validation errors, so the
/// sizes are checked before anything is created.
pub fn check_storage_limits(
    geometry: &FrameGeometry,
    limits: &wgpu::Limits,
) -> Result<(), GpuError> {
    let tiled_len = geometry.tiled_len() as u64;
    let buffer_limit = limits
        .max_buffer_size
        .min(u64::from(limits.max_storage_buffer_binding_size));
    if tiled_len > buffer_limit {
        return Err(GpuError::TooLarge {
            what: "dump buffer",
            size: tiled_len,
            limit: buffer_limit,
        });
    }

    let output = geometry.output();
    let side = output.width.max(output.height);
    if side > limits.max_texture_dimension_2d {
        return Err(GpuError::TooLarge {
            what: "output image side",
            size: u64::from(side),
            limit: u64::from(limits.max_texture_dimension_2d),
        });
    }
    Ok(())
}
