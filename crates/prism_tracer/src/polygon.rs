//! Polygonal shapes: boxes, pyramids and free-form triangle meshes.
//!
//! Every face is intersected as a plane through its first three corners and
//! then validated against all of its corners. The nearest accepted face wins.

use prism_core::shapes::{self, BOX_INDICES, BOX_STRIDE, PYRAMID_INDICES, PYRAMID_STRIDE};
use prism_core::CustomShape;
use prism_math::{Ray, Vec3, Vec4};

use crate::intersection::{Intersect, Intersection};
use crate::plane::{has_consistent_winding, Plane};

#[derive(Debug, Clone)]
struct Face {
    plane: Plane,
    corners: Vec<Vec4>,
}

/// Convex polygons sharing one vertex list.
#[derive(Debug, Clone)]
pub struct PolygonMesh {
    vertices: Vec<Vec4>,
    indices: Vec<u32>,
    stride: usize,
    faces: Vec<Face>,
}

impl PolygonMesh {
    /// Build a mesh whose faces take `stride` consecutive indices each.
    ///
    /// Faces referencing missing vertices are dropped with a warning. A
    /// trailing partial face is ignored.
    pub fn new(vertices: Vec<Vec4>, indices: Vec<u32>, stride: usize) -> Self {
        debug_assert!(stride >= 3, "faces need at least three corners");
        let mut faces = Vec::with_capacity(indices.len() / stride.max(1));
        for (i, face) in indices.chunks_exact(stride.max(3)).enumerate() {
            let corners: Option<Vec<Vec4>> = face
                .iter()
                .map(|&index| vertices.get(index as usize).copied())
                .collect();
            let Some(corners) = corners else {
                log::warn!("Face {} references a missing vertex, skipping", i);
                continue;
            };
            debug_assert!(
                stride == 3 || has_consistent_winding(&corners),
                "face {} is not wound consistently",
                i
            );
            faces.push(Face {
                plane: Plane::new(corners[0], corners[1], corners[2]),
                corners,
            });
        }
        Self {
            vertices,
            indices,
            stride,
            faces,
        }
    }

    /// Axis-aligned box between two corners.
    pub fn aabox(min: Vec3, max: Vec3) -> Self {
        let corners = shapes::aabox_corners(min, max);
        Self::new(corners.to_vec(), BOX_INDICES.to_vec(), BOX_STRIDE)
    }

    /// Box spanning -0.5..0.5 on every axis.
    pub fn unit_aabox() -> Self {
        Self::aabox(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    /// Square base of side 1 on y = 0 with the apex at (0, 1, 0).
    pub fn unit_pyramid() -> Self {
        let corners = shapes::unit_pyramid_corners();
        Self::new(corners.to_vec(), PYRAMID_INDICES.to_vec(), PYRAMID_STRIDE)
    }

    /// Triangle mesh from a custom shape node.
    pub fn from_custom(shape: &CustomShape) -> Self {
        Self::new(shape.vertices.clone(), shape.indices.clone(), 3)
    }

    pub fn vertices(&self) -> &[Vec4] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Indices per face.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl Intersect for PolygonMesh {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut closest: Option<Intersection> = None;
        for face in &self.faces {
            let Some(hit) = face.plane.intersect(ray) else {
                continue;
            };
            if !face.plane.is_inside(&face.corners, hit.point) {
                continue;
            }
            if closest.map_or(true, |c| hit.closer_than(&c)) {
                closest = Some(hit);
            }
        }
        closest
    }
}
