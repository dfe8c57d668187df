//! The desktop demo scene: two windows, a taskbar, bouncing lights and a
//! tic-tac-toe board.

use std::f32::consts::PI;

use prism_core::{
    AnimationNode, JumperNode, NodeId, NodeKind, RotationNode, SceneGraph, SceneResult, Texture,
    TextureShape,
};
use prism_math::{Transformation, Vec3};

/// Tag of the taskbar icon driven by the keyboard.
pub const ANIMATION_ICON_TAG: i32 = 12;
/// Tags of the board cells, row-major from the bottom left.
pub const BOARD_TAGS: std::ops::RangeInclusive<i32> = 20..=28;

const THICKNESS: f32 = 0.1;
const BULB: Vec3 = Vec3::new(1.0, 1.0, 0.0);

/// A desktop window, the tags of its title bar buttons and of the taskbar
/// icon that brings it back.
#[derive(Debug, Clone)]
pub struct DemoWindow {
    pub group: NodeId,
    pub minimize_tag: i32,
    pub zoom_tag: i32,
    pub restore_tag: i32,
    /// Slides the window down into the taskbar
    pub minimize_offset: Vec3,
    pub minimized: bool,
}

pub struct DemoScene {
    pub scene: SceneGraph,
    /// Ambient animations ticked every frame
    pub animations: Vec<AnimationNode>,
    /// Group moved by keyboard edits when nothing is selected
    pub animation_target: NodeId,
    /// Group holding the tic-tac-toe cells
    pub board: NodeId,
    /// Group carrying the camera, driven when zooming
    pub camera_group: NodeId,
    pub windows: Vec<DemoWindow>,
}

pub fn build() -> SceneResult<DemoScene> {
    let mut scene = SceneGraph::new();
    let root = scene.root();
    scene.set_transform(root, Transformation::translation(Vec3::new(0.0, 0.0, -15.0)))?;

    let eye = scene.add_group(root, translate(0.0, -1.0, 12.0))?;
    scene.add_child(eye, NodeKind::Camera { active: true })?;

    let mut animations = vec![
        add_light(&mut scene, Vec3::new(-3.0, -2.0, 4.0), Vec3::new(0.0, 5.0, 0.0))?,
        add_light(&mut scene, Vec3::new(-3.0, 3.0, 4.0), Vec3::new(7.0, 0.0, 0.0))?,
        add_light(&mut scene, Vec3::new(5.0, -3.0, -3.0), Vec3::new(0.0, 0.0, 7.0))?,
        add_light(&mut scene, Vec3::new(5.0, 0.0, 40.0), Vec3::new(-10.0, 0.0, 0.0))?,
    ];

    let left = add_window(&mut scene, -2.8, "Left", 1, 3)?;
    let right = add_window(&mut scene, 2.8, "Right", 2, 4)?;

    // left window content
    let pyramid_at = scene.add_group(left, translate(-1.0, -2.0, 1.0))?;
    let pyramid = scene.add_group(pyramid_at, scale(0.5, 0.5, 0.5))?;
    scene.add_child(pyramid, NodeKind::texture_pyramid(Texture::new("hci-logo.png")))?;

    let sphere_at = scene.add_group(left, translate(0.0, -0.5, 1.0))?;
    let sphere = scene.add_group(sphere_at, scale(0.3, 0.3, 0.3))?;
    scene.add_child(sphere, NodeKind::sphere(Vec3::new(0.5, 0.1, 0.3)))?;

    let box_at = scene.add_group(left, translate(1.0, -1.0, 1.0))?;
    let spinning_box = scene.add_group(box_at, scale(0.5, 0.5, 0.5))?;
    scene.add_child(spinning_box, NodeKind::aabox(Vec3::new(0.5, 0.1, 0.3)))?;

    let video_at = scene.add_group(left, translate(0.1, 1.0, 0.02))?;
    let video = scene.add_group(video_at, scale(4.0, 2.0, THICKNESS))?;
    let video = scene.add_group(video, Transformation::rotation(Vec3::Z, PI))?;
    scene.add_child(
        video,
        NodeKind::Textured {
            shape: TextureShape::VideoBox,
            texture: Texture::new("schalke.mp4"),
        },
    )?;

    let mut spin_box = RotationNode::new(spinning_box, Vec3::X);
    spin_box.active = true;
    let mut spin_pyramid =
        RotationNode::new(pyramid, Vec3::Y).with_speed(0.0003 * 4.0 * PI);
    spin_pyramid.active = true;
    animations.push(spin_box.into());
    animations.push(spin_pyramid.into());

    // right window content
    let board = scene.add_group(right, translate(-1.0, -1.0, 0.2))?;
    build_board(&mut scene, board)?;

    // taskbar
    let taskbar = scene.add_group(root, translate(0.0, -4.0, 0.0))?;
    let bar = scene.add_group(taskbar, scale(15.0, 1.0, 1.0))?;
    scene.add_child(bar, NodeKind::aabox(Vec3::splat(0.5)))?;

    add_icon(&mut scene, taskbar, -3.5, 10, NodeKind::aabox(Vec3::new(0.5, 0.1, 0.3)))?;
    add_icon(&mut scene, taskbar, -2.2, 11, NodeKind::aabox(Vec3::new(0.1, 0.5, 0.3)))?;
    add_icon(
        &mut scene,
        taskbar,
        -0.9,
        13,
        NodeKind::texture_box(Texture::new("hci-logo.png").with_normal_map("brickwall-normal.jpg")),
    )?;
    let animation_target = add_icon(
        &mut scene,
        taskbar,
        0.9,
        ANIMATION_ICON_TAG,
        NodeKind::aabox(Vec3::new(0.1, 0.3, 1.0)),
    )?;

    let backdrop_at = scene.add_group(root, translate(0.0, 0.0, -50.0))?;
    let backdrop = scene.add_group(backdrop_at, scale(200.0, 200.0, THICKNESS))?;
    scene.add_child(backdrop, NodeKind::aabox(Vec3::splat(0.1)))?;

    log::info!("Built demo scene with {} nodes", scene.len());

    let windows = vec![
        DemoWindow {
            group: left,
            minimize_tag: 1,
            zoom_tag: 3,
            restore_tag: 10,
            minimize_offset: Vec3::new(-2.0, -14.0, 0.0),
            minimized: false,
        },
        DemoWindow {
            group: right,
            minimize_tag: 2,
            zoom_tag: 4,
            restore_tag: 11,
            minimize_offset: Vec3::new(-6.0, -14.0, 0.0),
            minimized: false,
        },
    ];

    Ok(DemoScene {
        scene,
        animations,
        animation_target,
        board,
        camera_group: eye,
        windows,
    })
}

/// Fill `board` with nine empty cells.
pub fn build_board(scene: &mut SceneGraph, board: NodeId) -> SceneResult<()> {
    let cells = scene.add_group(board, scale(0.8, 0.8, THICKNESS))?;
    for i in 0..3 {
        for j in 0..3 {
            let cell = scene.add_group(cells, translate(i as f32 * 1.3, j as f32 * 1.3, 0.0))?;
            scene.set_tag(cell, Some(20 + i + j * 3))?;
            scene.add_child(
                cell,
                NodeKind::Textured {
                    shape: TextureShape::TextBox,
                    texture: Texture::new(" "),
                },
            )?;
        }
    }
    Ok(())
}

/// Drop every cell and lay out a fresh board.
pub fn reset_board(scene: &mut SceneGraph, board: NodeId) -> SceneResult<()> {
    scene.clear_children(board)?;
    build_board(scene, board)
}

fn translate(x: f32, y: f32, z: f32) -> Transformation {
    Transformation::translation(Vec3::new(x, y, z))
}

fn scale(x: f32, y: f32, z: f32) -> Transformation {
    Transformation::scaling(Vec3::new(x, y, z))
}

/// Light with a small bulb, bouncing along `swing`.
fn add_light(scene: &mut SceneGraph, at: Vec3, swing: Vec3) -> SceneResult<AnimationNode> {
    let holder = scene.add_group(scene.root(), Transformation::translation(at))?;
    scene.add_child(holder, NodeKind::Light)?;
    let bulb = scene.add_group(holder, scale(0.5, 0.5, 0.5))?;
    scene.add_child(bulb, NodeKind::sphere(BULB))?;

    let mut jumper = JumperNode::new(holder, swing);
    jumper.active = true;
    Ok(jumper.into())
}

/// Framed window with a title bar and a minimize and a zoom button carrying
/// the given tags. Returns the window group.
fn add_window(
    scene: &mut SceneGraph,
    x: f32,
    title: &str,
    minimize_tag: i32,
    zoom_tag: i32,
) -> SceneResult<NodeId> {
    let window = scene.add_group(scene.root(), translate(x, 0.5, 0.0))?;
    let frame = scene.add_group(window, scale(5.0, 5.25, THICKNESS))?;
    scene.add_child(frame, NodeKind::aabox(Vec3::new(0.4, 0.3, 0.0)))?;

    let bar_at = scene.add_group(window, translate(0.5, 2.9, 0.0))?;
    let bar = scene.add_group(bar_at, scale(2.0, 0.5, THICKNESS))?;
    scene.add_child(bar, NodeKind::aabox(Vec3::new(0.7, 0.1, 0.0)))?;

    let title_at = scene.add_group(window, translate(-1.49, 2.9, 0.0))?;
    let title_scale = scene.add_group(title_at, scale(2.0, 0.5, THICKNESS))?;
    let title_turn = scene.add_group(title_scale, Transformation::rotation(Vec3::Z, PI))?;
    scene.add_child(
        title_turn,
        NodeKind::Textured {
            shape: TextureShape::TextBox,
            texture: Texture::new(title),
        },
    )?;

    let buttons = [
        (2.25, minimize_tag, Vec3::new(0.3, 0.1, 1.0)),
        (1.75, zoom_tag, Vec3::new(0.7, 0.3, 0.3)),
    ];
    for (offset, tag, color) in buttons {
        let button_at = scene.add_group(window, translate(offset, 2.9, 0.0))?;
        let button = scene.add_group(button_at, scale(0.5, 0.5, THICKNESS))?;
        scene.set_tag(button, Some(tag))?;
        scene.add_child(button, NodeKind::aabox(color))?;
    }

    let panel_at = scene.add_group(window, translate(0.0, 0.0, 0.01))?;
    let panel = scene.add_group(panel_at, scale(4.5, 4.7, THICKNESS))?;
    scene.add_child(panel, NodeKind::aabox(Vec3::splat(0.9)))?;

    Ok(window)
}

fn add_icon(
    scene: &mut SceneGraph,
    taskbar: NodeId,
    x: f32,
    tag: i32,
    kind: NodeKind,
) -> SceneResult<NodeId> {
    let icon = scene.add_group(taskbar, translate(x, 0.01, 0.0))?;
    scene.set_tag(icon, Some(tag))?;
    let body = scene.add_group(icon, scale(1.0, 1.0, 1.1))?;
    scene.add_child(body, kind)?;
    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::survey;
    use prism_math::point;
    use prism_tracer::{RayTracer, RenderConfig};

    fn text_boxes(scene: &SceneGraph) -> usize {
        scene
            .iter()
            .filter(|(_, node)| {
                matches!(
                    node.kind,
                    NodeKind::Textured {
                        shape: TextureShape::TextBox,
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn test_demo_has_camera_and_four_lights() {
        let demo = build().unwrap();
        let found = survey(&demo.scene);

        assert_eq!(found.lights.len(), 4);
        let eye = found.camera_position().unwrap();
        assert!((eye - point(0.0, -1.0, -3.0)).length() < 1e-5);
        assert_eq!(demo.animations.len(), 6);
        assert!(demo.animations.iter().all(|a| a.is_active()));
    }

    #[test]
    fn test_tags_find_interactive_groups() {
        let demo = build().unwrap();
        assert_eq!(
            demo.scene.find_tagged(ANIMATION_ICON_TAG),
            Some(demo.animation_target)
        );
        for tag in BOARD_TAGS {
            let cell = demo.scene.find_tagged(tag).unwrap();
            assert!(demo.scene.is_ancestor(demo.board, cell));
        }
    }

    #[test]
    fn test_window_buttons_and_icons_are_tagged() {
        let demo = build().unwrap();
        assert_eq!(demo.windows.len(), 2);
        for window in &demo.windows {
            for tag in [window.minimize_tag, window.zoom_tag] {
                let button = demo.scene.find_tagged(tag).unwrap();
                assert!(demo.scene.is_ancestor(window.group, button));
            }
            let icon = demo.scene.find_tagged(window.restore_tag).unwrap();
            assert!(!demo.scene.is_ancestor(window.group, icon));
            assert!(!window.minimized);
        }
        let camera = survey(&demo.scene).camera_node.unwrap();
        assert_eq!(demo.scene.owning_group(camera).unwrap(), demo.camera_group);
    }

    #[test]
    fn test_reset_board_rebuilds_cells() {
        let mut demo = build().unwrap();
        // two window titles plus nine cells
        assert_eq!(text_boxes(&demo.scene), 11);
        let live = demo.scene.len();

        reset_board(&mut demo.scene, demo.board).unwrap();
        assert_eq!(text_boxes(&demo.scene), 11);
        assert_eq!(demo.scene.len(), live);
        assert_eq!(demo.scene.children(demo.board).unwrap().len(), 1);
    }

    #[test]
    fn test_backdrop_fills_ray_traced_frame() {
        let demo = build().unwrap();
        let tracer = RayTracer::new(RenderConfig {
            width: 16,
            height: 16,
            ..Default::default()
        });

        let image = tracer
            .render(&demo.scene, &prism_core::PhongValues::default())
            .unwrap();
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(image.get(x, y)[3], 255);
            }
        }
    }
}
