//! The seam between the raster visitor and a concrete GPU backend.

use prism_core::PhongValues;
use prism_math::{Mat4, Vec3, Vec4};

use crate::renderable::MeshHandle;

/// Most lights a shader receives. Extra lights are dropped with a warning.
pub const MAX_LIGHTS: usize = 8;

/// Fragment program selected for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderMode {
    /// Flat colour lit with Phong
    Phong,
    /// Texture coordinates drive the surface colour, lit with Phong
    Textured,
}

impl ShaderMode {
    pub const ALL: [ShaderMode; 2] = [ShaderMode::Phong, ShaderMode::Textured];

    pub fn index(self) -> usize {
        match self {
            ShaderMode::Phong => 0,
            ShaderMode::Textured => 1,
        }
    }
}

/// Everything a leaf draw needs besides its mesh and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniforms {
    /// Object to world
    pub model: Mat4,
    /// World to object
    pub model_inverse: Mat4,
    /// Inverse transpose of `model` without translation
    pub normal: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    /// World eye position (w = 1)
    pub camera_position: Vec4,
    /// World light positions (w = 1)
    pub lights: Vec<Vec4>,
    pub phong: PhongValues,
}

/// GPU layout of [`Uniforms`] plus the per-draw colour.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBlock {
    model: [[f32; 4]; 4],
    model_inverse: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    camera_position: [f32; 4],
    lights: [[f32; 4]; MAX_LIGHTS],
    light_count: [u32; 4],
    phong: [f32; 4],
    color: [f32; 4],
}

impl UniformBlock {
    /// Pack uniforms for a draw. `projection` must already be in the
    /// backend's clip-space convention.
    pub fn new(uniforms: &Uniforms, projection: Mat4, color: Vec3) -> Self {
        let mut lights = [[0.0; 4]; MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&uniforms.lights) {
            *slot = light.to_array();
        }
        let count = uniforms.lights.len().min(MAX_LIGHTS) as u32;
        let phong = &uniforms.phong;

        Self {
            model: uniforms.model.to_cols_array_2d(),
            model_inverse: uniforms.model_inverse.to_cols_array_2d(),
            normal: uniforms.normal.to_cols_array_2d(),
            view: uniforms.view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_position: uniforms.camera_position.to_array(),
            lights,
            light_count: [count, 0, 0, 0],
            phong: [phong.ambient, phong.diffuse, phong.specular, phong.shininess],
            color: color.extend(1.0).to_array(),
        }
    }

    pub fn light_count(&self) -> u32 {
        self.light_count[0]
    }
}

/// Receives uniforms and draw requests from the raster visitor.
pub trait Shader {
    /// Start a new frame, dropping anything recorded for the last one.
    fn clear(&mut self);

    /// Set the uniforms of `mode` for the draws that follow.
    fn set_uniforms(&mut self, mode: ShaderMode, uniforms: &Uniforms);

    /// Draw a mesh with the current uniforms of `mode`.
    fn draw(&mut self, mode: ShaderMode, mesh: MeshHandle, color: Vec3);
}
