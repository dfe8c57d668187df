//! Rasterisation by scene traversal.
//!
//! [`RasterSetupVisitor`] walks the graph once after a topology change and
//! builds a renderable for every geometry leaf. [`RasterVisitor`] walks it
//! every frame and hands each renderable its uniforms.

use std::collections::HashMap;

use prism_core::{
    survey, traverse, CustomShape, NodeId, PhongValues, SceneGraph, Texture, TextureShape,
    TransformStack, Visitor,
};
use prism_math::{Camera, Mat4Ext, Vec3, Vec4};
use thiserror::Error;

use crate::geometry::{MeshData, SPHERE_SLICES, SPHERE_STACKS};
use crate::renderable::{ColoredMesh, MeshHandle, MeshLibrary, Renderable, TexturedMesh};
use crate::shader::{Shader, ShaderMode, Uniforms, MAX_LIGHTS};

/// Errors from rasterising a frame.
#[derive(Error, Debug, PartialEq)]
pub enum RasterError {
    #[error("No active camera in scene")]
    NoActiveCamera,
}

pub type RasterResult<T> = Result<T, RasterError>;

/// Renderables keyed by node plus the meshes they reference.
#[derive(Default)]
pub struct RenderTable {
    meshes: MeshLibrary,
    renderables: HashMap<NodeId, Box<dyn Renderable>>,
}

impl RenderTable {
    pub fn meshes(&self) -> &MeshLibrary {
        &self.meshes
    }

    pub fn renderable(&self, id: NodeId) -> Option<&dyn Renderable> {
        self.renderables.get(&id).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

/// Builds a [`RenderTable`] for a scene.
pub struct RasterSetupVisitor {
    stack: TransformStack,
    table: RenderTable,
    sphere: MeshHandle,
    aabox: MeshHandle,
    pyramid: MeshHandle,
}

impl Default for RasterSetupVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSetupVisitor {
    pub fn new() -> Self {
        let mut meshes = MeshLibrary::new();
        let sphere = meshes.add(MeshData::unit_sphere(SPHERE_STACKS, SPHERE_SLICES));
        let aabox = meshes.add(MeshData::unit_aabox());
        let pyramid = meshes.add(MeshData::unit_pyramid());
        Self {
            stack: TransformStack::new(),
            table: RenderTable {
                meshes,
                renderables: HashMap::new(),
            },
            sphere,
            aabox,
            pyramid,
        }
    }

    /// Build the table for `graph`.
    pub fn setup(graph: &SceneGraph) -> RenderTable {
        let mut visitor = Self::new();
        traverse(graph, &mut visitor);
        log::info!(
            "Raster setup: {} renderables, {} meshes",
            visitor.table.len(),
            visitor.table.meshes.len()
        );
        visitor.table
    }

    fn insert(&mut self, id: NodeId, renderable: impl Renderable + 'static) {
        self.table.renderables.insert(id, Box::new(renderable));
    }
}

impl Visitor for RasterSetupVisitor {
    fn transforms(&mut self) -> &mut TransformStack {
        &mut self.stack
    }

    fn visit_sphere(&mut self, id: NodeId, color: Vec3) {
        let mesh = self.sphere;
        self.insert(id, ColoredMesh { mesh, color });
    }

    fn visit_aabox(&mut self, id: NodeId, color: Vec3) {
        let mesh = self.aabox;
        self.insert(id, ColoredMesh { mesh, color });
    }

    fn visit_pyramid(&mut self, id: NodeId, color: Vec3) {
        let mesh = self.pyramid;
        self.insert(id, ColoredMesh { mesh, color });
    }

    fn visit_custom_shape(&mut self, id: NodeId, shape: &CustomShape) {
        let mesh = self.table.meshes.add(MeshData::from_custom(shape));
        self.insert(
            id,
            ColoredMesh {
                mesh,
                color: shape.color,
            },
        );
    }

    fn visit_textured(&mut self, id: NodeId, shape: TextureShape, _texture: &Texture) {
        let mesh = match shape {
            TextureShape::Pyramid => self.pyramid,
            TextureShape::Box | TextureShape::VideoBox | TextureShape::TextBox => self.aabox,
        };
        self.insert(id, TexturedMesh { mesh });
    }
}

/// Per-frame view state shared by every leaf.
struct Frame {
    camera: Camera,
    lights: Vec<Vec4>,
    phong: PhongValues,
}

/// Drives a [`Shader`] over the scene.
pub struct RasterVisitor<'a> {
    stack: TransformStack,
    table: &'a RenderTable,
    shader: &'a mut dyn Shader,
    frame: Option<Frame>,
}

impl<'a> RasterVisitor<'a> {
    pub fn new(table: &'a RenderTable, shader: &'a mut dyn Shader) -> Self {
        Self {
            stack: TransformStack::new(),
            table,
            shader,
            frame: None,
        }
    }

    /// Render one frame.
    ///
    /// An explicit `camera` wins over the scene's active camera node and
    /// explicit `lights` over its light nodes.
    pub fn render(
        &mut self,
        graph: &SceneGraph,
        camera: Option<&Camera>,
        lights: Option<&[Vec4]>,
        phong: &PhongValues,
    ) -> RasterResult<()> {
        self.shader.clear();

        let found = survey(graph);
        let camera = match (camera, found.camera) {
            (Some(camera), _) => *camera,
            (None, Some(pose)) => Camera::from_pose(pose),
            (None, None) => return Err(RasterError::NoActiveCamera),
        };
        let lights = lights.map_or(found.lights, <[Vec4]>::to_vec);
        if lights.is_empty() {
            log::warn!("Scene has no lights, shading is ambient only");
        } else if lights.len() > MAX_LIGHTS {
            log::warn!("{} lights in scene, only the first {} are used", lights.len(), MAX_LIGHTS);
        }

        self.frame = Some(Frame {
            camera,
            lights,
            phong: *phong,
        });
        traverse(graph, self);
        self.frame = None;
        Ok(())
    }

    fn draw_leaf(&mut self, id: NodeId) {
        let Some(frame) = &self.frame else {
            return;
        };
        let Some(renderable) = self.table.renderable(id) else {
            panic!("No renderable for node {}, rebuild the render table after editing the scene", id);
        };

        let model_inverse = self.stack.top_inverse();
        let uniforms = Uniforms {
            model: self.stack.top(),
            model_inverse,
            normal: model_inverse.normal_matrix(),
            view: frame.camera.view_matrix(),
            projection: frame.camera.projection_matrix(),
            camera_position: frame.camera.eye.extend(1.0),
            lights: frame.lights.clone(),
            phong: frame.phong,
        };

        for mode in ShaderMode::ALL {
            self.shader.set_uniforms(mode, &uniforms);
        }
        renderable.render(&mut *self.shader);
    }
}

impl Visitor for RasterVisitor<'_> {
    fn transforms(&mut self) -> &mut TransformStack {
        &mut self.stack
    }

    fn visit_sphere(&mut self, id: NodeId, _color: Vec3) {
        self.draw_leaf(id);
    }

    fn visit_aabox(&mut self, id: NodeId, _color: Vec3) {
        self.draw_leaf(id);
    }

    fn visit_pyramid(&mut self, id: NodeId, _color: Vec3) {
        self.draw_leaf(id);
    }

    fn visit_custom_shape(&mut self, id: NodeId, _shape: &CustomShape) {
        self.draw_leaf(id);
    }

    fn visit_textured(&mut self, id: NodeId, _shape: TextureShape, _texture: &Texture) {
        self.draw_leaf(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::NodeKind;
    use prism_math::{point, Mat4, Transformation};

    #[derive(Default)]
    struct RecordingShader {
        clears: usize,
        current: [Option<Uniforms>; 2],
        draws: Vec<(ShaderMode, MeshHandle, Vec3, Uniforms)>,
    }

    impl Shader for RecordingShader {
        fn clear(&mut self) {
            self.clears += 1;
            self.draws.clear();
        }

        fn set_uniforms(&mut self, mode: ShaderMode, uniforms: &Uniforms) {
            self.current[mode.index()] = Some(uniforms.clone());
        }

        fn draw(&mut self, mode: ShaderMode, mesh: MeshHandle, color: Vec3) {
            let uniforms = self.current[mode.index()]
                .clone()
                .expect("uniforms set before draw");
            self.draws.push((mode, mesh, color, uniforms));
        }
    }

    struct Demo {
        scene: SceneGraph,
        sphere: NodeId,
        aabox: NodeId,
        crate_box: NodeId,
    }

    fn demo_scene() -> Demo {
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let eye = scene
            .add_group(root, Transformation::translation(Vec3::new(0.0, 0.0, 5.0)))
            .unwrap();
        scene.add_child(eye, NodeKind::Camera { active: true }).unwrap();
        let lamp = scene
            .add_group(root, Transformation::translation(Vec3::new(0.0, 4.0, 0.0)))
            .unwrap();
        scene.add_child(lamp, NodeKind::Light).unwrap();

        let left = scene
            .add_group(root, Transformation::translation(Vec3::new(-2.0, 0.0, 0.0)))
            .unwrap();
        let sphere = scene.add_child(left, NodeKind::sphere(Vec3::X)).unwrap();
        let right = scene
            .add_group(root, Transformation::scaling(Vec3::new(1.0, 2.0, 1.0)))
            .unwrap();
        let aabox = scene.add_child(right, NodeKind::aabox(Vec3::Y)).unwrap();
        let crate_box = scene
            .add_child(root, NodeKind::texture_box(Texture::new("crate.png")))
            .unwrap();

        Demo {
            scene,
            sphere,
            aabox,
            crate_box,
        }
    }

    #[test]
    fn test_setup_covers_geometry_leaves_only() {
        let demo = demo_scene();
        let table = RasterSetupVisitor::setup(&demo.scene);

        assert_eq!(table.len(), 3);
        assert!(table.renderable(demo.sphere).is_some());
        assert!(table.renderable(demo.aabox).is_some());
        assert!(table.renderable(demo.crate_box).is_some());
        assert!(table.renderable(demo.scene.root()).is_none());
        // unit shapes are shared
        assert_eq!(table.meshes().len(), 3);
    }

    #[test]
    fn test_setup_adds_mesh_per_custom_shape() {
        let mut scene = SceneGraph::new();
        let triangle = CustomShape::new(
            vec![point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
            Vec3::Z,
        );
        scene
            .add_child(scene.root(), NodeKind::CustomShape(triangle.clone()))
            .unwrap();
        scene
            .add_child(scene.root(), NodeKind::CustomShape(triangle))
            .unwrap();

        let table = RasterSetupVisitor::setup(&scene);
        assert_eq!(table.len(), 2);
        assert_eq!(table.meshes().len(), 5);
    }

    #[test]
    fn test_render_pushes_per_leaf_uniforms() {
        let demo = demo_scene();
        let table = RasterSetupVisitor::setup(&demo.scene);
        let mut shader = RecordingShader::default();

        RasterVisitor::new(&table, &mut shader)
            .render(&demo.scene, None, None, &PhongValues::default())
            .unwrap();

        assert_eq!(shader.clears, 1);
        assert_eq!(shader.draws.len(), 3);

        let (mode, _, color, uniforms) = &shader.draws[0];
        assert_eq!(*mode, ShaderMode::Phong);
        assert_eq!(*color, Vec3::X);
        assert_eq!(
            uniforms.model,
            Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0))
        );
        assert_eq!(
            uniforms.model_inverse,
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
        );
        // camera node at z = 5 looking down -z
        assert_eq!(uniforms.camera_position, point(0.0, 0.0, 5.0));
        assert!(uniforms
            .view
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)), 1e-5));
        assert_eq!(uniforms.lights, vec![point(0.0, 4.0, 0.0)]);

        // scaled box gets the inverse transpose without translation
        let (_, _, color, uniforms) = &shader.draws[1];
        assert_eq!(*color, Vec3::Y);
        let expected = Mat4::from_scale(Vec3::new(1.0, 0.5, 1.0));
        assert!(uniforms.normal.abs_diff_eq(expected, 1e-6));

        let (mode, _, _, _) = &shader.draws[2];
        assert_eq!(*mode, ShaderMode::Textured);
    }

    #[test]
    fn test_textured_leaves_reuse_unit_meshes() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let eye = scene
            .add_group(root, Transformation::translation(Vec3::new(0.0, 0.0, 5.0)))
            .unwrap();
        scene.add_child(eye, NodeKind::Camera { active: true }).unwrap();
        scene.add_child(root, NodeKind::pyramid(Vec3::X)).unwrap();
        scene
            .add_child(root, NodeKind::texture_pyramid(Texture::new("logo.png")))
            .unwrap();

        let table = RasterSetupVisitor::setup(&scene);
        assert_eq!(table.meshes().len(), 3);

        let mut shader = RecordingShader::default();
        RasterVisitor::new(&table, &mut shader)
            .render(&scene, None, None, &PhongValues::default())
            .unwrap();
        let (plain_mode, plain_mesh, _, _) = &shader.draws[0];
        let (textured_mode, textured_mesh, base, _) = &shader.draws[1];
        assert_eq!(*plain_mode, ShaderMode::Phong);
        assert_eq!(*textured_mode, ShaderMode::Textured);
        assert_eq!(plain_mesh, textured_mesh);
        assert_eq!(*base, Vec3::ONE);
    }

    #[test]
    fn test_both_modes_receive_scene_uniforms() {
        let demo = demo_scene();
        let table = RasterSetupVisitor::setup(&demo.scene);
        let mut shader = RecordingShader::default();

        RasterVisitor::new(&table, &mut shader)
            .render(&demo.scene, None, None, &PhongValues::default())
            .unwrap();

        let phong = shader.current[ShaderMode::Phong.index()].clone().unwrap();
        let textured = shader.current[ShaderMode::Textured.index()].clone().unwrap();
        assert_eq!(phong, textured);
    }

    #[test]
    fn test_explicit_camera_and_lights_win() {
        let demo = demo_scene();
        let table = RasterSetupVisitor::setup(&demo.scene);
        let mut shader = RecordingShader::default();
        let camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Z);
        let lights = [point(1.0, 1.0, 1.0), point(-1.0, 1.0, 1.0)];

        RasterVisitor::new(&table, &mut shader)
            .render(&demo.scene, Some(&camera), Some(&lights), &PhongValues::default())
            .unwrap();

        let (_, _, _, uniforms) = &shader.draws[0];
        assert_eq!(uniforms.view, camera.view_matrix());
        assert_eq!(uniforms.projection, camera.projection_matrix());
        assert_eq!(uniforms.camera_position, point(0.0, 10.0, 0.0));
        assert_eq!(uniforms.lights, lights.to_vec());
    }

    #[test]
    fn test_missing_camera_is_error() {
        let mut scene = SceneGraph::new();
        scene
            .add_child(scene.root(), NodeKind::sphere(Vec3::ONE))
            .unwrap();
        let table = RasterSetupVisitor::setup(&scene);
        let mut shader = RecordingShader::default();

        let result = RasterVisitor::new(&table, &mut shader).render(
            &scene,
            None,
            None,
            &PhongValues::default(),
        );
        assert_eq!(result, Err(RasterError::NoActiveCamera));
        assert!(shader.draws.is_empty());
    }

    #[test]
    #[should_panic(expected = "No renderable for node")]
    fn test_missing_renderable_panics() {
        let mut demo = demo_scene();
        let table = RasterSetupVisitor::setup(&demo.scene);
        // added after setup
        demo.scene
            .add_child(demo.scene.root(), NodeKind::pyramid(Vec3::ONE))
            .unwrap();

        let mut shader = RecordingShader::default();
        let _ = RasterVisitor::new(&table, &mut shader).render(
            &demo.scene,
            None,
            None,
            &PhongValues::default(),
        );
    }
}
