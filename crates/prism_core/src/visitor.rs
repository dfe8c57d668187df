//! Visitor dispatch over the scene graph.
//!
//! Every visitor owns a [`TransformStack`]. Entering a group pushes
//! `top * delta` and `delta_inverse * top_inverse`, the children are visited in
//! order and both stacks are popped on the way out. Leaves read the current top
//! to move between world and object space.

use prism_math::{Mat4, Transformation, Vec3};

use crate::scene::{CustomShape, Group, NodeId, NodeKind, SceneGraph, Texture, TextureShape};

/// Paired stacks of cumulative world matrices and their inverses.
#[derive(Clone, Debug)]
pub struct TransformStack {
    forward: Vec<Mat4>,
    inverse: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    /// Stack holding identity at its base.
    pub fn new() -> Self {
        Self {
            forward: vec![Mat4::IDENTITY],
            inverse: vec![Mat4::IDENTITY],
        }
    }

    /// Drop everything above the identity base.
    pub fn reset(&mut self) {
        self.forward.truncate(1);
        self.inverse.truncate(1);
    }

    pub fn push(&mut self, delta: &Transformation) {
        let top = self.top();
        let top_inverse = self.top_inverse();
        self.forward.push(top * delta.matrix());
        self.inverse.push(delta.inverse() * top_inverse);
    }

    /// Pop one level. The identity base is never removed.
    pub fn pop(&mut self) {
        if self.forward.len() > 1 {
            self.forward.pop();
            self.inverse.pop();
        }
    }

    /// Object to world matrix at the current depth.
    #[inline]
    pub fn top(&self) -> Mat4 {
        self.forward.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// World to object matrix at the current depth.
    #[inline]
    pub fn top_inverse(&self) -> Mat4 {
        self.inverse.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Number of pushed groups.
    pub fn depth(&self) -> usize {
        self.forward.len() - 1
    }
}

/// One method per node kind. Leaves default to no-ops, groups to the shared
/// push/recurse/pop walk.
pub trait Visitor {
    fn transforms(&mut self) -> &mut TransformStack;

    fn visit_group(&mut self, graph: &SceneGraph, _id: NodeId, group: &Group) {
        walk_group(self, graph, group);
    }

    fn visit_sphere(&mut self, _id: NodeId, _color: Vec3) {}

    fn visit_aabox(&mut self, _id: NodeId, _color: Vec3) {}

    fn visit_pyramid(&mut self, _id: NodeId, _color: Vec3) {}

    fn visit_custom_shape(&mut self, _id: NodeId, _shape: &CustomShape) {}

    fn visit_textured(&mut self, _id: NodeId, _shape: TextureShape, _texture: &Texture) {}

    fn visit_camera(&mut self, _id: NodeId, _active: bool) {}

    fn visit_light(&mut self, _id: NodeId) {}
}

/// Dispatch `visitor` on node `id`. Unknown handles are skipped.
pub fn accept<V: Visitor + ?Sized>(graph: &SceneGraph, id: NodeId, visitor: &mut V) {
    let Some(node) = graph.get(id) else {
        log::warn!("Skipping unknown node {}", id);
        return;
    };
    match &node.kind {
        NodeKind::Group(group) => visitor.visit_group(graph, id, group),
        NodeKind::Sphere { color } => visitor.visit_sphere(id, *color),
        NodeKind::AABox { color } => visitor.visit_aabox(id, *color),
        NodeKind::Pyramid { color } => visitor.visit_pyramid(id, *color),
        NodeKind::CustomShape(shape) => visitor.visit_custom_shape(id, shape),
        NodeKind::Textured { shape, texture } => visitor.visit_textured(id, *shape, texture),
        NodeKind::Camera { active } => visitor.visit_camera(id, *active),
        NodeKind::Light => visitor.visit_light(id),
    }
}

/// Push the group's transform, visit children in order, pop.
pub fn walk_group<V: Visitor + ?Sized>(visitor: &mut V, graph: &SceneGraph, group: &Group) {
    visitor.transforms().push(&group.transform);
    for &child in &group.children {
        accept(graph, child, visitor);
    }
    visitor.transforms().pop();
}

/// Reset the visitor's stacks and traverse from the root.
pub fn traverse<V: Visitor + ?Sized>(graph: &SceneGraph, visitor: &mut V) {
    visitor.transforms().reset();
    accept(graph, graph.root(), visitor);
}
