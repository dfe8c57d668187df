//! Renderables and the mesh library they draw from.

use prism_math::Vec3;

use crate::geometry::MeshData;
use crate::shader::{Shader, ShaderMode};

/// Index of a mesh in a [`MeshLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// Meshes shared by the renderables of one scene.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: Vec<MeshData>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mesh: MeshData) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &MeshData)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| (MeshHandle(i), mesh))
    }
}

/// Something the raster visitor can hand a shader.
pub trait Renderable {
    fn render(&self, shader: &mut dyn Shader);
}

/// Solid coloured mesh drawn with the Phong program.
#[derive(Debug, Clone)]
pub struct ColoredMesh {
    pub mesh: MeshHandle,
    pub color: Vec3,
}

impl Renderable for ColoredMesh {
    fn render(&self, shader: &mut dyn Shader) {
        shader.draw(ShaderMode::Phong, self.mesh, self.color);
    }
}

/// Mesh drawn with the textured program. Its surface pattern comes from the
/// shader, so only the mesh is kept.
#[derive(Debug, Clone, Copy)]
pub struct TexturedMesh {
    pub mesh: MeshHandle,
}

/// Base colour the textured program modulates.
const TEXTURED_BASE: Vec3 = Vec3::ONE;

impl Renderable for TexturedMesh {
    fn render(&self, shader: &mut dyn Shader) {
        shader.draw(ShaderMode::Textured, self.mesh, TEXTURED_BASE);
    }
}
