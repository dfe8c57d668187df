//! Scene graph types for Prism.
//!
//! The graph is an arena of nodes addressed by [`NodeId`]. Groups own their
//! children exclusively and carry the only transformations in the tree; every
//! other node kind is a leaf whose pose is the product of the groups above it.

use std::fmt;

use prism_math::{Mat4, Transformation, Vec3, Vec4};
use serde::Serialize;

use crate::error::{SceneError, SceneResult};

/// Stable handle of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interior node: a transformation applied to an ordered list of children.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Group {
    pub transform: Transformation,
    pub children: Vec<NodeId>,
    /// Opaque routing tag for UI code. Never read by the renderers.
    pub tag: Option<i32>,
}

/// Free-form triangle mesh in object space.
#[derive(Clone, Debug, Serialize)]
pub struct CustomShape {
    /// Homogeneous vertex positions (w = 1)
    pub vertices: Vec<Vec4>,
    /// Triangle indices, every 3 form one face
    pub indices: Vec<u32>,
    pub color: Vec3,
}

impl CustomShape {
    pub fn new(vertices: Vec<Vec4>, indices: Vec<u32>, color: Vec3) -> Self {
        Self {
            vertices,
            indices,
            color,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Reference to an externally loaded image source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Texture {
    pub source: String,
    /// Optional normal map source
    pub normal_map: Option<String>,
}

impl Texture {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            normal_map: None,
        }
    }

    pub fn with_normal_map(mut self, normal_map: impl Into<String>) -> Self {
        self.normal_map = Some(normal_map.into());
        self
    }
}

/// Shape a textured leaf is drawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TextureShape {
    Box,
    VideoBox,
    TextBox,
    Pyramid,
}

/// Closed set of node kinds.
#[derive(Clone, Debug, Serialize)]
pub enum NodeKind {
    Group(Group),
    /// Unit sphere at the origin
    Sphere { color: Vec3 },
    /// Axis-aligned box spanning -0.5..0.5
    AABox { color: Vec3 },
    /// Square base of side 1 on y = 0 with the apex at (0, 1, 0)
    Pyramid { color: Vec3 },
    CustomShape(CustomShape),
    Textured { shape: TextureShape, texture: Texture },
    Camera { active: bool },
    Light,
}

impl NodeKind {
    pub fn group(transform: Transformation) -> Self {
        NodeKind::Group(Group {
            transform,
            ..Default::default()
        })
    }

    pub fn sphere(color: Vec3) -> Self {
        NodeKind::Sphere { color }
    }

    pub fn aabox(color: Vec3) -> Self {
        NodeKind::AABox { color }
    }

    pub fn pyramid(color: Vec3) -> Self {
        NodeKind::Pyramid { color }
    }

    pub fn texture_box(texture: Texture) -> Self {
        NodeKind::Textured {
            shape: TextureShape::Box,
            texture,
        }
    }

    pub fn texture_pyramid(texture: Texture) -> Self {
        NodeKind::Textured {
            shape: TextureShape::Pyramid,
            texture,
        }
    }

    /// Leaves that can be hit by rays and drawn by the rasteriser.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            NodeKind::Sphere { .. }
                | NodeKind::AABox { .. }
                | NodeKind::Pyramid { .. }
                | NodeKind::CustomShape(_)
                | NodeKind::Textured { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Group(_) => "group",
            NodeKind::Sphere { .. } => "sphere",
            NodeKind::AABox { .. } => "aabox",
            NodeKind::Pyramid { .. } => "pyramid",
            NodeKind::CustomShape(_) => "custom shape",
            NodeKind::Textured { .. } => "textured",
            NodeKind::Camera { .. } => "camera",
            NodeKind::Light => "light",
        }
    }
}

/// A node in the arena.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    /// Enclosing group. Informational only.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// Arena-backed scene graph with a single root group.
#[derive(Clone, Debug, Serialize)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    /// Slots emptied by `clear_children`, reused before the arena grows
    #[serde(skip)]
    free: Vec<NodeId>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only an identity root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node {
                parent: None,
                kind: NodeKind::group(Transformation::IDENTITY),
            })],
            root: NodeId(0),
            free: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate live nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i as u32), node)))
    }

    /// Append a node to the children of `parent` and return its handle.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> SceneResult<NodeId> {
        // Validate before allocating so a failed add leaves no orphan.
        self.group(parent)?;

        let node = Node {
            parent: Some(parent),
            kind,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() as u32 - 1)
            }
        };
        self.group_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Shorthand for adding a child group.
    pub fn add_group(&mut self, parent: NodeId, transform: Transformation) -> SceneResult<NodeId> {
        self.add_child(parent, NodeKind::group(transform))
    }

    pub fn group(&self, id: NodeId) -> SceneResult<&Group> {
        match &self.node(id)?.kind {
            NodeKind::Group(group) => Ok(group),
            _ => Err(SceneError::NotAGroup(id)),
        }
    }

    pub fn group_mut(&mut self, id: NodeId) -> SceneResult<&mut Group> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Group(group) => Ok(group),
            _ => Err(SceneError::NotAGroup(id)),
        }
    }

    pub fn children(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.group(id)?.children)
    }

    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn transform(&self, id: NodeId) -> SceneResult<&Transformation> {
        Ok(&self.group(id)?.transform)
    }

    /// Replace a group's transformation.
    pub fn set_transform(&mut self, id: NodeId, transform: Transformation) -> SceneResult<()> {
        transform.debug_check();
        self.group_mut(id)?.transform = transform;
        Ok(())
    }

    /// Compose `delta` onto a group's transformation.
    pub fn compose(&mut self, id: NodeId, delta: &Transformation) -> SceneResult<()> {
        self.group_mut(id)?.transform.compose(delta);
        Ok(())
    }

    pub fn translate(&mut self, id: NodeId, offset: Vec3) -> SceneResult<()> {
        self.compose(id, &Transformation::translation(offset))
    }

    pub fn rotate(&mut self, id: NodeId, axis: Vec3, angle: f32) -> SceneResult<()> {
        self.compose(id, &Transformation::rotation(axis, angle))
    }

    pub fn scale(&mut self, id: NodeId, factors: Vec3) -> SceneResult<()> {
        self.compose(id, &Transformation::scaling(factors))
    }

    pub fn set_tag(&mut self, id: NodeId, tag: Option<i32>) -> SceneResult<()> {
        self.group_mut(id)?.tag = tag;
        Ok(())
    }

    /// First group carrying `tag`, in allocation order.
    pub fn find_tagged(&self, tag: i32) -> Option<NodeId> {
        self.iter().find_map(|(id, node)| match &node.kind {
            NodeKind::Group(group) if group.tag == Some(tag) => Some(id),
            _ => None,
        })
    }

    /// Enable or disable a camera node.
    pub fn set_camera_active(&mut self, id: NodeId, active: bool) -> SceneResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Camera { active: flag } => {
                *flag = active;
                Ok(())
            }
            _ => Err(SceneError::NotACamera(id)),
        }
    }

    pub fn texture_mut(&mut self, id: NodeId) -> SceneResult<&mut Texture> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Textured { texture, .. } => Ok(texture),
            _ => Err(SceneError::NotTextured(id)),
        }
    }

    /// Object to world matrix of `id`: the product of every group transform
    /// from the root down to `id`, including its own when it is a group.
    pub fn world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if let NodeKind::Group(group) = &node.kind {
                matrix = group.transform.matrix() * matrix;
            }
            current = node.parent;
        }
        Ok(matrix)
    }

    /// Nearest tag on the parent chain of `id`, starting at `id` itself.
    pub fn nearest_tag(&self, id: NodeId) -> Option<i32> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if let NodeKind::Group(Group { tag: Some(tag), .. }) = node.kind {
                return Some(tag);
            }
            current = node.parent;
        }
        None
    }

    /// Detach and free every descendant of a group.
    ///
    /// Freed handles become unknown until `add_child` recycles their slots, so
    /// callers must drop any handle into the cleared subtree. The group itself
    /// keeps its transformation and can be repopulated.
    pub fn clear_children(&mut self, id: NodeId) -> SceneResult<()> {
        let mut pending = std::mem::take(&mut self.group_mut(id)?.children);
        let mut freed = 0usize;
        while let Some(child) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(child.index()).and_then(Option::take) {
                if let NodeKind::Group(group) = node.kind {
                    pending.extend(group.children);
                }
                self.free.push(child);
                freed += 1;
            }
        }
        log::debug!("Cleared {} nodes below {}", freed, id);
        Ok(())
    }

    /// True when `ancestor` lies on the parent chain of `id` (or is `id`).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).and_then(|n| n.parent);
        }
        false
    }

    /// Nearest enclosing group of a node, the node itself if it is a group.
    pub fn owning_group(&self, id: NodeId) -> SceneResult<NodeId> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Group(_) => Ok(id),
            _ => node.parent.ok_or(SceneError::UnknownNode(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_creation() {
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let group = scene
            .add_group(root, Transformation::translation(Vec3::X))
            .unwrap();
        let sphere = scene.add_child(group, NodeKind::sphere(Vec3::X)).unwrap();
        scene.add_child(root, NodeKind::Light).unwrap();

        assert_eq!(scene.len(), 4);
        assert_eq!(scene.children(root).unwrap().len(), 2);
        assert_eq!(scene.children(group).unwrap(), &[sphere]);
        assert_eq!(scene.parent(sphere).unwrap(), Some(group));
        assert!(scene.node(sphere).unwrap().kind.is_geometry());
    }

    #[test]
    fn test_add_child_to_leaf_fails() {
        let mut scene = SceneGraph::new();
        let light = scene.add_child(scene.root(), NodeKind::Light).unwrap();

        let err = scene.add_child(light, NodeKind::Light).unwrap_err();
        assert_eq!(err, SceneError::NotAGroup(light));
        // nothing was allocated
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_edits_compose_onto_group() {
        let mut scene = SceneGraph::new();
        let group = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();

        scene.translate(group, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.scale(group, Vec3::splat(2.0)).unwrap();
        scene.rotate(group, Vec3::Y, 0.5).unwrap();

        let t = scene.transform(group).unwrap();
        assert!(t.is_consistent(1e-4));
        let origin = t.matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.x - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_clear_children_frees_subtree() {
        let mut scene = SceneGraph::new();
        let board = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();
        let cell = scene.add_group(board, Transformation::IDENTITY).unwrap();
        let piece = scene.add_child(cell, NodeKind::aabox(Vec3::ONE)).unwrap();

        scene.clear_children(board).unwrap();

        assert!(scene.children(board).unwrap().is_empty());
        assert!(scene.get(cell).is_none());
        assert_eq!(scene.node(piece).unwrap_err(), SceneError::UnknownNode(piece));
        assert_eq!(scene.len(), 2);

        // rebuild
        let fresh = scene.add_child(board, NodeKind::sphere(Vec3::ONE)).unwrap();
        assert_eq!(scene.children(board).unwrap(), &[fresh]);
    }

    #[test]
    fn test_world_matrix_composes_parent_chain() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .set_transform(root, Transformation::translation(Vec3::new(0.0, 0.0, -10.0)))
            .unwrap();
        let arm = scene
            .add_group(root, Transformation::scaling(Vec3::splat(2.0)))
            .unwrap();
        let hand = scene
            .add_group(arm, Transformation::translation(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let ball = scene.add_child(hand, NodeKind::sphere(Vec3::ONE)).unwrap();

        let origin = scene.world_matrix(hand).unwrap() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin - Vec4::new(2.0, 0.0, -10.0, 1.0)).length() < 1e-5);
        assert_eq!(scene.world_matrix(ball).unwrap(), scene.world_matrix(hand).unwrap());
        assert!(scene.world_matrix(NodeId(99)).is_err());
    }

    #[test]
    fn test_cleared_slots_are_reused() {
        let mut scene = SceneGraph::new();
        let board = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();
        let fill = |scene: &mut SceneGraph| {
            for _ in 0..9 {
                let cell = scene.add_group(board, Transformation::IDENTITY).unwrap();
                scene.add_child(cell, NodeKind::aabox(Vec3::ONE)).unwrap();
            }
        };

        fill(&mut scene);
        let slots = scene.nodes.len();
        for _ in 0..5 {
            scene.clear_children(board).unwrap();
            fill(&mut scene);
        }

        assert_eq!(scene.nodes.len(), slots);
        assert_eq!(scene.len(), 2 + 18);
        assert!(scene.free.is_empty());
        // every recycled node hangs under the board again
        assert!(scene.iter().all(|(id, _)| id.index() < 2 || scene.is_ancestor(board, id)));
    }

    #[test]
    fn test_tags_and_cameras() {
        let mut scene = SceneGraph::new();
        let group = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();
        let camera = scene
            .add_child(group, NodeKind::Camera { active: false })
            .unwrap();

        scene.set_tag(group, Some(7)).unwrap();
        assert_eq!(scene.find_tagged(7), Some(group));
        assert_eq!(scene.find_tagged(8), None);

        scene.set_camera_active(camera, true).unwrap();
        assert!(matches!(
            scene.node(camera).unwrap().kind,
            NodeKind::Camera { active: true }
        ));
        assert_eq!(
            scene.set_camera_active(group, true).unwrap_err(),
            SceneError::NotACamera(group)
        );
    }

    #[test]
    fn test_ancestry() {
        let mut scene = SceneGraph::new();
        let outer = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();
        let inner = scene.add_group(outer, Transformation::IDENTITY).unwrap();
        let leaf = scene.add_child(inner, NodeKind::pyramid(Vec3::ONE)).unwrap();

        assert!(scene.is_ancestor(outer, leaf));
        assert!(scene.is_ancestor(scene.root(), leaf));
        assert!(!scene.is_ancestor(leaf, outer));
        assert_eq!(scene.owning_group(leaf).unwrap(), inner);
        assert_eq!(scene.owning_group(inner).unwrap(), inner);
    }

    #[test]
    fn test_texture_edit_and_tag_lookup() {
        let mut scene = SceneGraph::new();
        let cell = scene
            .add_group(scene.root(), Transformation::IDENTITY)
            .unwrap();
        scene.set_tag(cell, Some(20)).unwrap();
        let body = scene.add_group(cell, Transformation::IDENTITY).unwrap();
        let text = scene
            .add_child(body, NodeKind::texture_box(Texture::new(" ")))
            .unwrap();

        scene.texture_mut(text).unwrap().source = "X".to_string();
        match &scene.node(text).unwrap().kind {
            NodeKind::Textured { texture, .. } => assert_eq!(texture.source, "X"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(scene.texture_mut(body).unwrap_err(), SceneError::NotTextured(body));

        assert_eq!(scene.nearest_tag(text), Some(20));
        assert_eq!(scene.nearest_tag(scene.root()), None);
    }
}
