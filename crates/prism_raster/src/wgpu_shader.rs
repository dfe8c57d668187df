//! wgpu implementation of [`Shader`].
//!
//! Draw requests are recorded during traversal and encoded into a single
//! render pass afterwards, one uniform buffer per draw.

use prism_math::Vec3;
use wgpu::util::DeviceExt;

use crate::geometry::Vertex;
use crate::gpu::{GpuContext, GpuError, GpuResult, DEPTH_FORMAT, OPENGL_TO_WGPU};
use crate::renderable::{MeshHandle, MeshLibrary};
use crate::shader::{Shader, ShaderMode, UniformBlock, Uniforms};

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

struct PendingDraw {
    mode: ShaderMode,
    mesh: MeshHandle,
    block: UniformBlock,
}

/// Records draws from the raster visitor and replays them on the GPU.
pub struct WgpuShader {
    pipelines: [wgpu::RenderPipeline; 2],
    bind_group_layout: wgpu::BindGroupLayout,
    meshes: Vec<GpuMesh>,
    current: [Option<Uniforms>; 2],
    draws: Vec<PendingDraw>,
}

impl WgpuShader {
    pub fn new(ctx: &GpuContext) -> Self {
        let device = &ctx.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = [
            create_pipeline(device, &pipeline_layout, &module, ctx.format(), "fs_phong"),
            create_pipeline(device, &pipeline_layout, &module, ctx.format(), "fs_textured"),
        ];

        Self {
            pipelines,
            bind_group_layout,
            meshes: Vec::new(),
            current: [None, None],
            draws: Vec::new(),
        }
    }

    /// Replace the GPU meshes with the contents of `library`.
    pub fn upload_meshes(&mut self, ctx: &GpuContext, library: &MeshLibrary) {
        self.meshes = library
            .iter()
            .map(|(handle, mesh)| GpuMesh {
                vertex_buffer: ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Vertex Buffer {}", handle.0)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Index Buffer {}", handle.0)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                num_indices: mesh.indices.len() as u32,
            })
            .collect();
        log::info!("Uploaded {} meshes", self.meshes.len());
    }

    /// Number of draws recorded since the last clear.
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Encode the recorded draws into a pass that clears `target`.
    pub fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) -> GpuResult<()> {
        let bind_groups: Vec<wgpu::BindGroup> = self
            .draws
            .iter()
            .map(|draw| {
                let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Uniform Buffer"),
                    contents: bytemuck::cast_slice(&[draw.block]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Uniform Bind Group"),
                    layout: &self.bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Raster Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: ctx.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for (draw, bind_group) in self.draws.iter().zip(&bind_groups) {
            let mesh = self
                .meshes
                .get(draw.mesh.0)
                .ok_or(GpuError::UnknownMesh(draw.mesh.0))?;
            render_pass.set_pipeline(&self.pipelines[draw.mode.index()]);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
        }

        Ok(())
    }
}

impl Shader for WgpuShader {
    fn clear(&mut self) {
        self.draws.clear();
        self.current = [None, None];
    }

    fn set_uniforms(&mut self, mode: ShaderMode, uniforms: &Uniforms) {
        self.current[mode.index()] = Some(uniforms.clone());
    }

    fn draw(&mut self, mode: ShaderMode, mesh: MeshHandle, color: Vec3) {
        let Some(uniforms) = &self.current[mode.index()] else {
            log::warn!("Draw of mesh {} before uniforms were set, skipping", mesh.0);
            return;
        };
        let block = UniformBlock::new(uniforms, OPENGL_TO_WGPU * uniforms.projection, color);
        self.draws.push(PendingDraw { mode, mesh, block });
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    fragment_entry: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // custom shapes have arbitrary winding, the fragment shader lights both sides
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
