//! CPU-side triangle geometry for rasterisation.
//!
//! Polygonal shapes are flattened to unshared triangles so every face keeps
//! its own normal. Spheres are tessellated by latitude and longitude.

use std::f32::consts::PI;

use prism_core::shapes::{self, BOX_INDICES, BOX_STRIDE, PYRAMID_INDICES, PYRAMID_INTERIOR, PYRAMID_STRIDE};
use prism_core::CustomShape;
use prism_math::{Vec2, Vec3, Vec4};

/// Vertex data for rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Latitude bands of the tessellated sphere.
pub const SPHERE_STACKS: u32 = 16;
/// Longitude bands of the tessellated sphere.
pub const SPHERE_SLICES: u32 = 32;

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat-shaded triangles of convex faces taking `stride` indices each.
    ///
    /// With `center` set, face normals are flipped to point away from it.
    /// Otherwise they follow the winding of each face. Faces referencing
    /// missing corners are skipped.
    pub fn from_faces(corners: &[Vec4], indices: &[u32], stride: usize, center: Option<Vec3>) -> Self {
        let positions: Vec<Vec3> = corners.iter().map(|v| v.truncate()).collect();
        let stride = stride.max(3);
        let face_uvs = face_uvs(stride);

        let mut data = Self::default();
        for face in indices.chunks_exact(stride) {
            let Some(corners) = face
                .iter()
                .map(|&i| positions.get(i as usize).copied())
                .collect::<Option<Vec<Vec3>>>()
            else {
                continue;
            };

            let mut normal = (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .normalize_or_zero();
            if let Some(center) = center {
                if normal.dot(corners[0] - center) < 0.0 {
                    normal = -normal;
                }
            }

            // fan around the first corner
            for k in 1..stride - 1 {
                for corner in [0, k, k + 1] {
                    data.indices.push(data.vertices.len() as u32);
                    data.vertices
                        .push(Vertex::new(corners[corner], normal, face_uvs[corner]));
                }
            }
        }
        data
    }

    /// Box spanning -0.5..0.5 with outward normals.
    pub fn unit_aabox() -> Self {
        Self::from_faces(&shapes::unit_aabox_corners(), &BOX_INDICES, BOX_STRIDE, Some(Vec3::ZERO))
    }

    /// Unit pyramid with outward normals.
    pub fn unit_pyramid() -> Self {
        Self::from_faces(
            &shapes::unit_pyramid_corners(),
            &PYRAMID_INDICES,
            PYRAMID_STRIDE,
            Some(PYRAMID_INTERIOR),
        )
    }

    pub fn from_custom(shape: &CustomShape) -> Self {
        Self::from_faces(&shape.vertices, &shape.indices, 3, None)
    }

    /// Unit sphere at the origin.
    pub fn unit_sphere(stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let mut data = Self::default();

        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let theta = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let phi = u * 2.0 * PI;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
                data.vertices
                    .push(Vertex::new(normal, normal, Vec2::new(u, 1.0 - v)));
            }
        }

        let row = slices + 1;
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * row + slice;
                let b = a + row;
                data.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        data
    }
}

fn face_uvs(stride: usize) -> Vec<Vec2> {
    match stride {
        3 => vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)],
        4 => vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        n => (0..n)
            .map(|i| {
                let angle = i as f32 / n as f32 * 2.0 * PI;
                Vec2::new(0.5 + 0.5 * angle.cos(), 0.5 + 0.5 * angle.sin())
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::point;

    #[test]
    fn test_box_is_flat_shaded_and_outward() {
        let aabox = MeshData::unit_aabox();
        assert_eq!(aabox.triangle_count(), 12);
        assert_eq!(aabox.vertices.len(), 36);

        for tri in aabox.vertices.chunks(3) {
            let normal = Vec3::from_array(tri[0].normal);
            assert!(tri.iter().all(|v| v.normal == tri[0].normal));
            assert!((normal.length() - 1.0).abs() < 1e-5);
            // every corner lies on the face the normal points out of
            for v in tri {
                assert!((Vec3::from_array(v.position).dot(normal) - 0.5).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_pyramid_normals_point_away_from_interior() {
        let pyramid = MeshData::unit_pyramid();
        assert_eq!(pyramid.triangle_count(), 6);

        let inside = PYRAMID_INTERIOR;
        for v in &pyramid.vertices {
            let to_corner = Vec3::from_array(v.position) - inside;
            assert!(Vec3::from_array(v.normal).dot(to_corner) > 0.0);
        }
    }

    #[test]
    fn test_sphere_tessellation() {
        let sphere = MeshData::unit_sphere(SPHERE_STACKS, SPHERE_SLICES);
        assert_eq!(
            sphere.vertices.len() as u32,
            (SPHERE_STACKS + 1) * (SPHERE_SLICES + 1)
        );
        assert_eq!(sphere.triangle_count() as u32, SPHERE_STACKS * SPHERE_SLICES * 2);

        for v in &sphere.vertices {
            assert!((Vec3::from_array(v.position).length() - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
        let max = sphere.vertices.len() as u32;
        assert!(sphere.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn test_custom_shape_skips_invalid_faces() {
        let shape = CustomShape::new(
            vec![point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(0.0, 1.0, 0.0)],
            vec![0, 1, 2, 0, 1, 7],
            Vec3::ONE,
        );
        let mesh = MeshData::from_custom(&shape);
        assert_eq!(mesh.triangle_count(), 1);
        // counter-clockwise seen from +z
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[2].uv, [0.5, 1.0]);
    }
}
