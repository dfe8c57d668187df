//! Window-independent viewer state.
//!
//! Owns the scene and its animations, turns key actions and clicks into
//! edits, and advances everything once per frame. The window loop in
//! `main.rs` only forwards events and draws.

use std::path::PathBuf;

use anyhow::{Context, Result};
use prism_core::{
    dump_scene, simulate_all, survey, AnimationNode, DriverNode, JumperNode, NodeId,
    PhongValues, RotationNode, ScalerNode, SceneGraph, SceneResult,
};
use prism_math::{point, Camera, Vec3};
use prism_tracer::{pick, pick_ray, ImageBuffer, PickSurface, RayTracer, RenderConfig};

use crate::controls::Action;
use crate::demo::{self, DemoScene, DemoWindow, BOARD_TAGS};

/// Keyboard edits stop after this many milliseconds.
pub const EDIT_DURATION_MS: f32 = 1000.0;

const DRIVE_DISTANCE: f32 = 5.0;
const DRIVE_SPEED: f32 = 0.0002;
const JUMP_SPEED: f32 = 0.005;
const WINDOW_SPEED: f32 = 0.001;
/// How far a zoom drives the camera along the view ray.
pub const ZOOM_DISTANCE: f32 = 7.0;
const ZOOM_SPEED: f32 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Rasterised,
    RayTraced,
}

/// An edit started by the user.
struct UserEdit {
    animation: AnimationNode,
    remaining_ms: Option<f32>,
    from_keyboard: bool,
}

pub struct Viewer {
    pub scene: SceneGraph,
    pub phong: PhongValues,
    mode: RenderMode,
    tracer: RayTracer,
    animations: Vec<AnimationNode>,
    edits: Vec<UserEdit>,
    animation_target: NodeId,
    board: NodeId,
    camera_group: NodeId,
    windows: Vec<DemoWindow>,
    /// Camera offset of the current zoom, if zoomed in
    zoom: Option<Vec3>,
    player_one: bool,
    table_dirty: bool,
    snapshot_pending: bool,
    output_dir: PathBuf,
}

impl Viewer {
    pub fn new(demo: DemoScene, config: RenderConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            scene: demo.scene,
            phong: PhongValues::default(),
            mode: RenderMode::Rasterised,
            tracer: RayTracer::new(config),
            animations: demo.animations,
            edits: Vec::new(),
            animation_target: demo.animation_target,
            board: demo.board,
            camera_group: demo.camera_group,
            windows: demo.windows,
            zoom: None,
            player_one: true,
            table_dirty: true,
            snapshot_pending: false,
            output_dir: output_dir.into(),
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// True once after the scene structure changed.
    pub fn take_table_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.table_dirty, false)
    }

    /// A keyboard edit is still moving the animation icon.
    pub fn keyboard_edit_running(&self) -> bool {
        self.edits.iter().any(|edit| edit.from_keyboard)
    }

    pub fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Rasterise => {
                self.mode = RenderMode::Rasterised;
                log::info!("Mode toggled: rasterisation");
            }
            Action::RayTrace => {
                self.mode = RenderMode::RayTraced;
                self.snapshot_pending = true;
                log::info!("Mode toggled: ray tracing");
            }
            Action::Drive(direction) => {
                let driver = DriverNode::new(self.animation_target, direction * DRIVE_DISTANCE)
                    .with_speed(DRIVE_SPEED);
                self.start_keyboard_edit(driver.into(), Some(EDIT_DURATION_MS));
            }
            Action::Rotate(axis) => {
                let rotation = RotationNode::new(self.animation_target, axis);
                self.start_keyboard_edit(rotation.into(), Some(EDIT_DURATION_MS));
            }
            Action::Scale(target) => {
                let scaler = ScalerNode::new(self.animation_target, Vec3::splat(target)).once();
                self.start_keyboard_edit(scaler.into(), None);
            }
            Action::Dump => {
                let path = self.output_dir.join("scene.json");
                let json = dump_scene(&self.scene, &self.phong)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Scene written to {}", path.display());
            }
            Action::ResetBoard => {
                // cell slots are recycled, so edits on old cells must go first
                let (scene, board) = (&self.scene, self.board);
                self.edits.retain(|edit| {
                    let group = edit.animation.group();
                    group == board || !scene.is_ancestor(board, group)
                });
                demo::reset_board(&mut self.scene, self.board)?;
                self.table_dirty = true;
                log::info!("Board reset");
            }
        }
        Ok(())
    }

    fn start_keyboard_edit(&mut self, mut animation: AnimationNode, remaining_ms: Option<f32>) {
        if self.keyboard_edit_running() {
            log::debug!("Edit in progress, ignoring key");
            return;
        }
        animation.set_active(true);
        self.edits.push(UserEdit {
            animation,
            remaining_ms,
            from_keyboard: true,
        });
    }

    /// Start a one-shot edit that runs until the animation stops itself.
    fn start_edit(&mut self, animation: impl Into<AnimationNode>) {
        let mut animation = animation.into();
        animation.set_active(true);
        self.edits.push(UserEdit {
            animation,
            remaining_ms: None,
            from_keyboard: false,
        });
    }

    /// Camera the rasteriser draws a `window_size` frame with, posed by the
    /// active camera node.
    pub fn raster_camera(&self, window_size: (u32, u32)) -> Option<Camera> {
        let pose = survey(&self.scene).camera?;
        let mut camera = Camera::from_pose(pose);
        camera.set_aspect(window_size.0.max(1) as f32 / window_size.1.max(1) as f32);
        Some(camera)
    }

    /// Pick surface matching the current mode for a window of `window_size`
    /// pixels, with the cursor position mapped onto it.
    pub fn pick_surface(&self, cursor: (f64, f64), window_size: (u32, u32)) -> (f32, f32, PickSurface) {
        let (width, height) = (window_size.0.max(1), window_size.1.max(1));
        match self.mode {
            RenderMode::RayTraced => {
                let pinhole = self.tracer.config().pinhole();
                let x = cursor.0 as f32 * pinhole.width as f32 / width as f32;
                let y = cursor.1 as f32 * pinhole.height as f32 / height as f32;
                (x, y, PickSurface::RayTraced(pinhole))
            }
            RenderMode::Rasterised => {
                // without a camera node nothing is rasterised to hit anyway
                let camera = self.raster_camera((width, height)).unwrap_or_default();
                let surface = PickSurface::Rasterised {
                    width,
                    height,
                    camera,
                };
                (cursor.0 as f32, cursor.1 as f32, surface)
            }
        }
    }

    /// Pick at (x, y) on `surface` and react to the hit node.
    ///
    /// Untagged groups jump up once and board cells cycle their symbol and
    /// hop towards the viewer. Window buttons minimize or zoom to their
    /// window and taskbar icons restore a minimized one.
    pub fn click(&mut self, x: f32, y: f32, surface: &PickSurface) -> Result<Option<NodeId>> {
        let Some(leaf) = pick(&self.scene, x, y, surface)? else {
            return Ok(None);
        };
        let group = self.scene.owning_group(leaf)?;
        log::debug!("Picked {} in group {}", leaf, group);

        match self.scene.nearest_tag(group) {
            None => {
                let jumper = JumperNode::new(group, Vec3::new(0.0, 0.5, 0.0))
                    .with_speed(JUMP_SPEED)
                    .once();
                self.start_edit(jumper);
            }
            Some(tag) if BOARD_TAGS.contains(&tag) => {
                self.toggle_symbol(leaf)?;
                let hop = JumperNode::new(group, Vec3::new(0.0, 0.0, 0.3))
                    .with_speed(JUMP_SPEED)
                    .once();
                self.start_edit(hop);
            }
            Some(tag) => self.window_action(tag)?,
        }
        Ok(Some(leaf))
    }

    /// Minimize, restore or zoom to the window addressed by `tag`.
    fn window_action(&mut self, tag: i32) -> Result<()> {
        let Some(index) = self
            .windows
            .iter()
            .position(|w| [w.minimize_tag, w.zoom_tag, w.restore_tag].contains(&tag))
        else {
            log::debug!("Nothing bound to tag {}", tag);
            return Ok(());
        };
        let window = &self.windows[index];

        if tag == window.zoom_tag {
            let centre = self.scene.world_matrix(window.group)? * point(0.0, 0.0, 0.0);
            let eye = survey(&self.scene)
                .camera_position()
                .context("Scene has no active camera")?;
            return self.zoom_along((centre - eye).truncate());
        }

        let minimize = tag == window.minimize_tag;
        if minimize == window.minimized {
            return Ok(());
        }
        let offset = if minimize {
            window.minimize_offset
        } else {
            -window.minimize_offset
        };
        let group = window.group;
        self.windows[index].minimized = minimize;
        self.start_edit(DriverNode::new(group, offset).with_speed(WINDOW_SPEED).once());
        log::info!("Window {} {}", group, if minimize { "minimized" } else { "restored" });

        if minimize {
            if let Some(offset) = self.zoom.take() {
                self.drive_camera(-offset);
            }
        }
        Ok(())
    }

    /// Zoom the camera towards pixel (x, y) of `surface`, or back out when
    /// already zoomed in.
    pub fn zoom(&mut self, x: f32, y: f32, surface: &PickSurface) -> Result<()> {
        let ray = pick_ray(&self.scene, x, y, surface)?;
        self.zoom_along(ray.direction.truncate())
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom.is_some()
    }

    /// Drive the camera group [`ZOOM_DISTANCE`] along the world direction
    /// `towards`, or undo the last zoom.
    fn zoom_along(&mut self, towards: Vec3) -> Result<()> {
        if let Some(offset) = self.zoom.take() {
            self.drive_camera(-offset);
            return Ok(());
        }
        let pose = survey(&self.scene)
            .camera
            .context("Scene has no active camera")?;
        // the group moves in the frame of its parent
        let into_parent = self.scene.transform(self.camera_group)?.matrix() * pose.inverse();
        let offset =
            (into_parent * towards.normalize_or_zero().extend(0.0)).truncate() * ZOOM_DISTANCE;
        self.zoom = Some(offset);
        self.drive_camera(offset);
        Ok(())
    }

    fn drive_camera(&mut self, offset: Vec3) {
        let driver = DriverNode::new(self.camera_group, offset)
            .with_speed(ZOOM_SPEED)
            .once();
        self.start_edit(driver);
    }

    /// Cycle a board cell through X, O and empty.
    fn toggle_symbol(&mut self, leaf: NodeId) -> SceneResult<()> {
        let texture = self.scene.texture_mut(leaf)?;
        let next = match texture.source.as_str() {
            "X" => "O",
            "O" => "",
            _ if self.player_one => "X",
            _ => "O",
        };
        texture.source = next.to_string();
        self.player_one = !self.player_one;
        Ok(())
    }

    /// Advance ambient animations and user edits by `dt` milliseconds.
    pub fn tick(&mut self, dt: f32) -> SceneResult<()> {
        simulate_all(&mut self.animations, &mut self.scene, dt)?;

        for edit in &mut self.edits {
            edit.animation.simulate(&mut self.scene, dt)?;
            if let Some(remaining) = &mut edit.remaining_ms {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    edit.animation.set_active(false);
                }
            }
        }
        self.edits.retain(|edit| edit.animation.is_active());
        Ok(())
    }

    /// Ray trace the scene. The first frame after switching to ray tracing
    /// is also written to `frame.png`.
    pub fn ray_trace(&mut self) -> Result<ImageBuffer> {
        let image = self.tracer.render(&self.scene, &self.phong)?;
        if std::mem::take(&mut self.snapshot_pending) {
            let path = self.output_dir.join("frame.png");
            image.save_png(&path)?;
            log::info!("Frame saved to {}", path.display());
        }
        Ok(image)
    }
}
