//! Prism Raster - GPU rasterisation of scene graphs
//!
//! The raster visitors are backend independent: they talk to a [`Shader`] and
//! hand each geometry leaf's [`Renderable`] its uniforms. [`WgpuShader`] is
//! the wgpu backend used by the viewer.
//!
//! # Example
//!
//! ```ignore
//! let table = RasterSetupVisitor::setup(&scene);
//! let mut shader = WgpuShader::new(&ctx);
//! shader.upload_meshes(&ctx, table.meshes());
//!
//! RasterVisitor::new(&table, &mut shader).render(&scene, None, None, &phong)?;
//! ctx.frame(|encoder, view| shader.encode(&ctx, encoder, view, wgpu::Color::BLACK))?;
//! ```

mod blit;
mod geometry;
mod gpu;
mod raster_visitor;
mod renderable;
mod shader;
mod wgpu_shader;

pub use blit::FrameBlit;
pub use geometry::{MeshData, Vertex, SPHERE_SLICES, SPHERE_STACKS};
pub use gpu::{GpuContext, GpuError, GpuResult, DEPTH_FORMAT, OPENGL_TO_WGPU};
pub use raster_visitor::{RasterError, RasterResult, RasterSetupVisitor, RasterVisitor, RenderTable};
pub use renderable::{ColoredMesh, MeshHandle, MeshLibrary, Renderable, TexturedMesh};
pub use shader::{Shader, ShaderMode, UniformBlock, Uniforms, MAX_LIGHTS};
pub use wgpu_shader::WgpuShader;
