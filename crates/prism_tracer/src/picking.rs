//! Mouse picking.
//!
//! A single ray is built for the clicked pixel using the conventions of the
//! surface that was clicked, every geometry leaf it passes through is recorded
//! and the nearest one is returned.

use std::cmp::Ordering;

use prism_core::{
    survey, traverse, CustomShape, NodeId, SceneGraph, Texture, TextureShape, TransformStack,
    Visitor,
};
use prism_math::{Camera, PinholeCamera, Ray, Vec3};

use crate::error::{RenderError, RenderResult};
use crate::intersection::{Intersect, Intersection};
use crate::polygon::PolygonMesh;
use crate::ray_visitor::{intersect_in_world, UnitShapes};

/// Side length of the rasterised canvas in pixels.
pub const RASTER_SURFACE_SIZE: u32 = 500;

/// Which view the click landed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickSurface {
    /// Ray-traced canvas; rays leave the active camera node.
    RayTraced(PinholeCamera),
    /// Rasterised canvas seen through `camera`, which must be the camera the
    /// frame was rasterised with.
    Rasterised { width: u32, height: u32, camera: Camera },
}

impl PickSurface {
    /// Default ray-traced canvas (100x100, 60 degree opening).
    pub fn ray_traced() -> Self {
        Self::RayTraced(PinholeCamera::default())
    }

    /// Default rasterised canvas viewed through `camera`.
    pub fn rasterised(camera: Camera) -> Self {
        Self::Rasterised {
            width: RASTER_SURFACE_SIZE,
            height: RASTER_SURFACE_SIZE,
            camera,
        }
    }
}

/// World-space ray through pixel (x, y) of `surface`.
pub fn pick_ray(graph: &SceneGraph, x: f32, y: f32, surface: &PickSurface) -> RenderResult<Ray> {
    match surface {
        PickSurface::RayTraced(pinhole) => {
            let to_world = survey(graph).camera.ok_or(RenderError::NoActiveCamera)?;
            Ok(pinhole.make_ray(x, y).transformed(&to_world))
        }
        PickSurface::Rasterised {
            width,
            height,
            camera,
        } => {
            let pinhole = PinholeCamera::new(*width, *height, camera.horizontal_angle());
            Ok(pinhole.make_ray(x, y).transformed(&camera.to_world()))
        }
    }
}

/// Collects every geometry hit along one ray.
pub struct MouseRayVisitor<'a> {
    stack: TransformStack,
    ray: Ray,
    shapes: &'a UnitShapes,
    hits: Vec<(Intersection, Ray, NodeId)>,
}

impl<'a> MouseRayVisitor<'a> {
    pub fn new(shapes: &'a UnitShapes, ray: Ray) -> Self {
        Self {
            stack: TransformStack::new(),
            ray,
            shapes,
            hits: Vec::new(),
        }
    }

    /// Traverse from the root and sort the hits nearest first.
    pub fn run(&mut self, graph: &SceneGraph) {
        self.hits.clear();
        traverse(graph, self);
        self.hits
            .sort_by(|a, b| a.0.t.partial_cmp(&b.0.t).unwrap_or(Ordering::Equal));
        log::debug!("Pick ray hit {} node(s)", self.hits.len());
    }

    /// World hit, object-space ray and node of every hit, nearest first.
    pub fn hits(&self) -> &[(Intersection, Ray, NodeId)] {
        &self.hits
    }

    pub fn closest(&self) -> Option<NodeId> {
        self.hits.first().map(|(_, _, id)| *id)
    }

    fn test(&mut self, id: NodeId, shape: &dyn Intersect) {
        if let Some((hit, local_ray)) = intersect_in_world(&self.stack, &self.ray, shape) {
            self.hits.push((hit, local_ray, id));
        }
    }
}

impl Visitor for MouseRayVisitor<'_> {
    fn transforms(&mut self) -> &mut TransformStack {
        &mut self.stack
    }

    fn visit_sphere(&mut self, id: NodeId, _color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.sphere);
    }

    fn visit_aabox(&mut self, id: NodeId, _color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.aabox);
    }

    fn visit_pyramid(&mut self, id: NodeId, _color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.pyramid);
    }

    fn visit_custom_shape(&mut self, id: NodeId, shape: &CustomShape) {
        self.test(id, &PolygonMesh::from_custom(shape));
    }

    fn visit_textured(&mut self, id: NodeId, shape: TextureShape, _texture: &Texture) {
        let shapes = self.shapes;
        match shape {
            TextureShape::Pyramid => self.test(id, &shapes.pyramid),
            _ => self.test(id, &shapes.aabox),
        }
    }
}

/// Node under pixel (x, y) of `surface`, if any.
pub fn pick(graph: &SceneGraph, x: f32, y: f32, surface: &PickSurface) -> RenderResult<Option<NodeId>> {
    let ray = pick_ray(graph, x, y, surface)?;
    let shapes = UnitShapes::default();
    let mut visitor = MouseRayVisitor::new(&shapes, ray);
    visitor.run(graph);
    Ok(visitor.closest())
}
