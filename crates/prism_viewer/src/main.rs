mod controls;
mod demo;
mod viewer;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use prism_raster::{
    FrameBlit, GpuContext, GpuError, RasterSetupVisitor, RasterVisitor, RenderTable, WgpuShader,
};
use prism_tracer::{RenderConfig, RASTER_SURFACE_SIZE};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use crate::controls::action_for;
use crate::viewer::{RenderMode, Viewer};

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// GPU resources, created once the window exists
struct Gpu {
    ctx: GpuContext,
    shader: WgpuShader,
    blit: FrameBlit,
    table: Option<RenderTable>,
}

impl Gpu {
    fn draw(&mut self, viewer: &mut Viewer) -> Result<(), GpuError> {
        match viewer.mode() {
            RenderMode::Rasterised => {
                if viewer.take_table_dirty() || self.table.is_none() {
                    let table = RasterSetupVisitor::setup(&viewer.scene);
                    self.shader.upload_meshes(&self.ctx, table.meshes());
                    self.table = Some(table);
                }
                if let Some(table) = &self.table {
                    // picking reads the same camera for this surface size
                    let camera = viewer.raster_camera(self.ctx.size);
                    let mut visitor = RasterVisitor::new(table, &mut self.shader);
                    if let Err(e) = visitor.render(&viewer.scene, camera.as_ref(), None, &viewer.phong) {
                        log::error!("Rasterisation failed: {}", e);
                    }
                }
                let (ctx, shader) = (&self.ctx, &self.shader);
                ctx.frame(|encoder, view| shader.encode(ctx, encoder, view, CLEAR_COLOR))
            }
            RenderMode::RayTraced => {
                match viewer.ray_trace() {
                    Ok(image) => self.blit.upload(&self.ctx, (image.width, image.height), image.as_rgba()),
                    Err(e) => log::error!("Ray tracing failed: {:#}", e),
                }
                let blit = &self.blit;
                self.ctx.frame(|encoder, view| {
                    blit.encode(encoder, view, CLEAR_COLOR);
                    Ok(())
                })
            }
        }
    }
}

/// Application state
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    viewer: Viewer,
    cursor: Option<(f64, f64)>,
    modifiers: ModifiersState,
    last_frame_time: Instant,
}

impl App {
    fn new(viewer: Viewer) -> Self {
        Self {
            window: None,
            gpu: None,
            viewer,
            cursor: None,
            modifiers: ModifiersState::empty(),
            last_frame_time: Instant::now(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Prism Viewer")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                RASTER_SURFACE_SIZE,
                RASTER_SURFACE_SIZE,
            ))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        // GpuContext::new is async, block on it
        let ctx = pollster::block_on(GpuContext::new(window.clone()))?;
        let shader = WgpuShader::new(&ctx);
        let blit = FrameBlit::new(&ctx);

        self.window = Some(window);
        self.gpu = Some(Gpu {
            ctx,
            shader,
            blit,
            table: None,
        });
        log::info!("Window and renderer initialized");
        Ok(())
    }

    fn click(&mut self) {
        let (Some(cursor), Some(window)) = (self.cursor, &self.window) else {
            return;
        };
        let size = window.inner_size();
        let (x, y, surface) = self.viewer.pick_surface(cursor, (size.width, size.height));
        if self.modifiers.shift_key() {
            match self.viewer.zoom(x, y, &surface) {
                Ok(()) if self.viewer.is_zoomed() => log::info!("Zooming in"),
                Ok(()) => log::info!("Zooming out"),
                Err(e) => log::error!("Zoom failed: {:#}", e),
            }
            return;
        }
        match self.viewer.click(x, y, &surface) {
            Ok(Some(node)) => log::info!("Clicked node {}", node),
            Ok(None) => log::debug!("Click hit nothing"),
            Err(e) => log::error!("Picking failed: {:#}", e),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        if let Err(e) = self.viewer.tick(dt) {
            log::error!("Animation failed: {}", e);
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        match gpu.draw(&mut self.viewer) {
            Ok(()) => {}
            Err(GpuError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                gpu.ctx.reconfigure();
            }
            Err(GpuError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Out of memory!");
                event_loop.exit();
            }
            Err(e) => log::error!("Render error: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("Failed to initialize: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.ctx.resize((physical_size.width, physical_size.height));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => self.click(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(keycode),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = action_for(keycode) {
                    if let Err(e) = self.viewer.apply(action) {
                        log::error!("{:?} failed: {:#}", action, e);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Prism Viewer");

    let demo = demo::build()?;
    let viewer = Viewer::new(demo, RenderConfig::default(), std::env::current_dir()?);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(viewer);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
