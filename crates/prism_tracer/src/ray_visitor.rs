//! CPU ray tracer over the scene graph.
//!
//! One primary ray per pixel is cast from the active camera. The visitor
//! moves the ray into each leaf's object space with the cumulative inverse,
//! intersects the unit shape, and maps the hit back to world space where the
//! closest hit of the traversal is kept and shaded with Phong.

use std::collections::HashMap;

use prism_core::{
    survey, traverse, CustomShape, NodeId, NodeKind, PhongValues, SceneGraph, Texture, TextureShape,
    TransformStack, Visitor,
};
use prism_math::{point, Mat4, Mat4Ext, PinholeCamera, Ray, Vec3, Vec4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::error::{RenderError, RenderResult};
use crate::framebuffer::{color_to_rgba, ImageBuffer};
use crate::intersection::{Intersect, Intersection};
use crate::phong::phong;
use crate::polygon::PolygonMesh;
use crate::sphere::Sphere;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Horizontal opening angle in radians
    pub alpha: f32,
    /// Edge length of a render bucket
    pub bucket_size: u32,
    /// Trace buckets on the rayon pool
    pub parallel: bool,
    /// Flat colour for textured leaves
    pub texture_color: Vec3,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            alpha: std::f32::consts::FRAC_PI_3,
            bucket_size: DEFAULT_BUCKET_SIZE,
            parallel: true,
            texture_color: Vec3::splat(0.7),
        }
    }
}

impl RenderConfig {
    pub fn pinhole(&self) -> PinholeCamera {
        PinholeCamera::new(self.width, self.height, self.alpha)
    }
}

/// Object-space shapes shared by every leaf of a kind.
#[derive(Debug, Clone)]
pub struct UnitShapes {
    pub sphere: Sphere,
    pub aabox: PolygonMesh,
    pub pyramid: PolygonMesh,
}

impl Default for UnitShapes {
    fn default() -> Self {
        Self {
            sphere: Sphere::unit(),
            aabox: PolygonMesh::unit_aabox(),
            pyramid: PolygonMesh::unit_pyramid(),
        }
    }
}

/// Per-frame state gathered before tracing: camera pose, lights and meshes
/// for custom shapes.
#[derive(Debug, Clone)]
pub struct SceneView {
    /// Camera to world matrix
    pub camera_to_world: Mat4,
    /// World light positions (w = 1)
    pub lights: Vec<Vec4>,
    meshes: HashMap<NodeId, PolygonMesh>,
}

impl SceneView {
    /// Use the first active camera node and all light nodes.
    pub fn survey(graph: &SceneGraph) -> RenderResult<Self> {
        let found = survey(graph);
        let camera_to_world = found.camera.ok_or(RenderError::NoActiveCamera)?;
        if found.lights.is_empty() {
            log::warn!("Scene has no lights, shading is ambient only");
        }
        Ok(Self::with_camera(graph, camera_to_world, found.lights))
    }

    /// Use an explicit camera pose and light list.
    pub fn with_camera(graph: &SceneGraph, camera_to_world: Mat4, lights: Vec<Vec4>) -> Self {
        let meshes = graph
            .iter()
            .filter_map(|(id, node)| match &node.kind {
                NodeKind::CustomShape(shape) => {
                    Some((id, PolygonMesh::from_custom(shape)))
                }
                _ => None,
            })
            .collect();
        Self {
            camera_to_world,
            lights,
            meshes,
        }
    }

    /// World-space eye position.
    pub fn camera_position(&self) -> Vec4 {
        self.camera_to_world * point(0.0, 0.0, 0.0)
    }

    /// World-space primary ray through a pixel of `pinhole`.
    pub fn primary_ray(&self, pinhole: &PinholeCamera, x: f32, y: f32) -> Ray {
        pinhole.make_ray(x, y).transformed(&self.camera_to_world)
    }

    pub fn mesh(&self, id: NodeId) -> Option<&PolygonMesh> {
        self.meshes.get(&id)
    }
}

/// Closest hit of a traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// World-space intersection
    pub intersection: Intersection,
    pub node: NodeId,
    pub color: Vec3,
}

/// Intersect a world ray with a leaf shape under the given transforms.
///
/// Returns the hit in world space with `t` measured along `world_ray` and the
/// normal transformed by the inverse transpose.
pub(crate) fn intersect_in_world(
    stack: &TransformStack,
    world_ray: &Ray,
    shape: &dyn Intersect,
) -> Option<(Intersection, Ray)> {
    let to_world = stack.top();
    let from_world = stack.top_inverse();
    let local_ray = world_ray.transformed(&from_world);

    let local = shape.intersect(&local_ray)?;
    let point = to_world * local.point;
    let normal = (from_world.normal_matrix() * local.normal).normalize_or_zero();
    let t = world_ray.parameter_of(point);
    if t < 0.0 {
        return None;
    }
    Some((Intersection { t, point, normal }, local_ray))
}

/// Visitor tracing one ray through the graph and keeping the closest hit.
pub struct RayVisitor<'a> {
    stack: TransformStack,
    ray: Ray,
    shapes: &'a UnitShapes,
    view: &'a SceneView,
    texture_color: Vec3,
    closest: Option<Hit>,
}

impl<'a> RayVisitor<'a> {
    pub fn new(shapes: &'a UnitShapes, view: &'a SceneView, texture_color: Vec3) -> Self {
        Self {
            stack: TransformStack::new(),
            ray: Ray::new(point(0.0, 0.0, 0.0), Vec4::ZERO),
            shapes,
            view,
            texture_color,
            closest: None,
        }
    }

    /// Trace `ray` from the root and return the closest hit.
    pub fn trace(&mut self, graph: &SceneGraph, ray: Ray) -> Option<Hit> {
        self.ray = ray;
        self.closest = None;
        traverse(graph, self);
        self.closest
    }

    fn test(&mut self, id: NodeId, shape: &dyn Intersect, color: Vec3) {
        let Some((intersection, _)) = intersect_in_world(&self.stack, &self.ray, shape) else {
            return;
        };
        let closer = self
            .closest
            .map_or(true, |c| intersection.closer_than(&c.intersection));
        if closer {
            self.closest = Some(Hit {
                intersection,
                node: id,
                color,
            });
        }
    }
}

impl Visitor for RayVisitor<'_> {
    fn transforms(&mut self) -> &mut TransformStack {
        &mut self.stack
    }

    fn visit_sphere(&mut self, id: NodeId, color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.sphere, color);
    }

    fn visit_aabox(&mut self, id: NodeId, color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.aabox, color);
    }

    fn visit_pyramid(&mut self, id: NodeId, color: Vec3) {
        let shapes = self.shapes;
        self.test(id, &shapes.pyramid, color);
    }

    fn visit_custom_shape(&mut self, id: NodeId, shape: &CustomShape) {
        let view = self.view;
        match view.mesh(id) {
            Some(mesh) => self.test(id, mesh, shape.color),
            None => self.test(id, &PolygonMesh::from_custom(shape), shape.color),
        }
    }

    fn visit_textured(&mut self, id: NodeId, shape: TextureShape, _texture: &Texture) {
        let shapes = self.shapes;
        let color = self.texture_color;
        match shape {
            TextureShape::Pyramid => self.test(id, &shapes.pyramid, color),
            TextureShape::Box | TextureShape::VideoBox | TextureShape::TextBox => {
                self.test(id, &shapes.aabox, color)
            }
        }
    }
}

/// Ray tracer holding configuration and the shared unit shapes.
#[derive(Debug, Clone, Default)]
pub struct RayTracer {
    config: RenderConfig,
    shapes: UnitShapes,
}

impl RayTracer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            shapes: UnitShapes::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn shapes(&self) -> &UnitShapes {
        &self.shapes
    }

    /// Render from the scene's active camera with its light nodes.
    pub fn render(&self, graph: &SceneGraph, phong: &PhongValues) -> RenderResult<ImageBuffer> {
        let view = SceneView::survey(graph)?;
        Ok(self.render_view(graph, &view, phong))
    }

    /// Render with a prepared view.
    pub fn render_view(&self, graph: &SceneGraph, view: &SceneView, phong: &PhongValues) -> ImageBuffer {
        let start = std::time::Instant::now();
        let mut image = ImageBuffer::new(self.config.width, self.config.height);
        let buckets = generate_buckets(self.config.width, self.config.height, self.config.bucket_size);

        let results: Vec<BucketResult> = if self.config.parallel {
            buckets
                .par_iter()
                .map(|bucket| render_bucket(self, bucket, graph, view, phong))
                .collect()
        } else {
            buckets
                .iter()
                .map(|bucket| render_bucket(self, bucket, graph, view, phong))
                .collect()
        };

        for result in &results {
            image.write_bucket(result);
        }

        log::info!(
            "Traced {}x{} in {} buckets ({:.1?})",
            self.config.width,
            self.config.height,
            results.len(),
            start.elapsed()
        );
        image
    }

    /// Closest hit through pixel (x, y).
    pub fn trace_pixel(&self, graph: &SceneGraph, view: &SceneView, x: u32, y: u32) -> Option<Hit> {
        let ray = view.primary_ray(&self.config.pinhole(), x as f32, y as f32);
        RayVisitor::new(&self.shapes, view, self.config.texture_color).trace(graph, ray)
    }

    /// Shaded RGBA of pixel (x, y); zero when nothing is hit.
    pub fn shade_pixel(
        &self,
        graph: &SceneGraph,
        view: &SceneView,
        phong_values: &PhongValues,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        match self.trace_pixel(graph, view, x, y) {
            Some(hit) => color_to_rgba(phong(
                hit.color,
                &hit.intersection,
                &view.lights,
                phong_values,
                view.camera_position(),
            )),
            None => [0, 0, 0, 0],
        }
    }
}
