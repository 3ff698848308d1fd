// Sample pass - Draws the detiled image to a render target
//
// The image holds packed 32-bit words; the fragment shader splits them into
// channels according to the dump's ChannelOrder. Converted LinearPixels
// (0xAARRGGBB) read back as B, G, R, A bytes, so the CPU strategy draws
// through the same pass with ChannelOrder::Bgra.

use super::context::GpuContext;
use super::GpuError;
use crate::framebuffer::ChannelOrder;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// WGSL source of the sampling pass
pub const SAMPLE_SHADER_SOURCE: &str = include_str!("shaders/sample.wgsl");

/// Uniform block matching `SampleParams` in the shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct SampleParams {
    pub channel_order: u32,
    pub force_opaque: u32,
    pub _pad: [u32; 2],
}

impl SampleParams {
    pub fn new(order: ChannelOrder, force_opaque: bool) -> Self {
        Self {
            channel_order: order.shader_code(),
            force_opaque: force_opaque as u32,
            _pad: [0; 2],
        }
    }
}

/// Render pipeline drawing one full-screen triangle
pub struct SamplePass {
    pipeline: wgpu::RenderPipeline,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    current: SampleParams,
}

impl SamplePass {
    /// Build the pass for a target format, reading from `image`
    pub fn new(
        ctx: &GpuContext,
        target_format: wgpu::TextureFormat,
        image: &wgpu::TextureView,
        params: SampleParams,
    ) -> Result<Self, GpuError> {
        let (pipeline, bind_group_layout) = ctx.validated("sample pass", |device| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("sample shader"),
                source: wgpu::ShaderSource::Wgsl(SAMPLE_SHADER_SOURCE.into()),
            });

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("sample bind group layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Uint,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
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
                label: Some("sample pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("sample pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            });

            (pipeline, bind_group_layout)
        })?;

        let params_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sample params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sample bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(image),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(Self {
            pipeline,
            params: params_buffer,
            bind_group,
            current: params,
        })
    }

    /// Change how image words are decoded, if it differs from the current setting
    pub fn set_params(&mut self, queue: &wgpu::Queue, params: SampleParams) {
        if params != self.current {
            queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&params));
            self.current = params;
        }
    }

    /// Record the draw into `target`, clearing it first
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sample pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.7,
                        g: 0.7,
                        b: 0.7,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
