use std::{sync::Arc, time::Duration};

use anyhow::Context;
use cgmath::Point3;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::{
    config::ViewerConfig,
    gfx::{
        backend::{BackendCall, RecordingBackend},
        camera::{CameraController, FlyCamera, FrameInput, LookCapture},
        rendering::{FrameOutcome, FrameSequencer, RenderEngine},
        scene::{ObjImporter, SceneRegistry},
    },
    performance::{FrameClock, PerformanceMonitor},
};

/// Windowed viewer: owns the configuration until the event loop starts
pub struct ViewerApp {
    config: ViewerConfig,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    registry: Option<SceneRegistry>,
    sequencer: Option<FrameSequencer>,
    controller: CameraController,
    clock: FrameClock,
    monitor: PerformanceMonitor,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Opens the window and runs until exit. Load and frame failures are returned.
    pub fn run(self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app_state = AppState::new(self.config);
        event_loop
            .run_app(&mut app_state)
            .context("event loop terminated abnormally")?;

        match app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn new(config: ViewerConfig) -> Self {
        let controller = CameraController::new(config.bindings.clone(), config.look_capture);
        Self {
            config,
            window: None,
            render_engine: None,
            registry: None,
            sequencer: None,
            controller,
            clock: FrameClock::new(),
            monitor: PerformanceMonitor::new(),
            error: None,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.window.title.clone())
                    .with_inner_size(LogicalSize::new(
                        self.config.window.width,
                        self.config.window.height,
                    )),
            )
            .context("failed to create window")?;
        let window_handle = Arc::new(window);

        let size = window_handle.inner_size();
        let window_clone = window_handle.clone();
        let render_config = self.config.render;
        let mut renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, size.width, size.height, &render_config).await
        })
        .context("failed to initialize renderer")?;

        let registry = SceneRegistry::load(
            self.config.scene_specs(),
            &ObjImporter::new(),
            &mut renderer,
        )
        .context("failed to load scene")?;

        self.controller.resized(size);
        self.sequencer = Some(FrameSequencer::new(
            FlyCamera::new(self.config.camera),
            self.config.projection,
            self.config.render.clear_mask,
            renderer.surface_size(),
        ));
        self.registry = Some(registry);
        self.render_engine = Some(renderer);
        self.window = Some(window_handle);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let input = self.controller.take_frame_input();

        let (Some(render_engine), Some(registry), Some(sequencer)) = (
            self.render_engine.as_mut(),
            self.registry.as_ref(),
            self.sequencer.as_mut(),
        ) else {
            return;
        };

        match sequencer.frame(registry, render_engine, &input, dt.as_secs_f32()) {
            Ok(FrameOutcome::Presented(stats)) => self.monitor.record_frame(dt, &stats),
            Ok(FrameOutcome::Exit) => event_loop.exit(),
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("frame failed")),
        }
    }

    /// Hides and captures the pointer while the look trigger is held.
    fn update_cursor_grab(&self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let looking = self.controller.is_looking();

        window.set_cursor_visible(!looking);
        match (self.controller.capture(), looking) {
            (LookCapture::Relative, true) => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    log::warn!("cursor grab unavailable: {}", e);
                }
            }
            (LookCapture::CenterWarp, true) => {
                if let Err(e) = window.set_cursor_position(self.controller.window_center()) {
                    log::warn!("cursor warp unavailable: {}", e);
                }
            }
            (_, false) => {
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("failed to release cursor: {}", e);
                }
            }
        }
    }

    /// Gives every scene buffer back to the renderer, once.
    fn release_scene(&mut self) {
        let (Some(registry), Some(render_engine)) =
            (self.registry.take(), self.render_engine.as_mut())
        else {
            return;
        };

        if let Err(e) = registry.release(render_engine) {
            log::error!("failed to release scene buffers: {}", e);
            if self.error.is_none() {
                self.error = Some(anyhow::Error::new(e).context("scene release failed"));
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }

        if let Err(e) = self.initialize(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.render_engine.is_none() {
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.controller.process_keyboard_event(&event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if self.controller.process_mouse_button(button, state) {
                    self.update_cursor_grab();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (Some(center), Some(window)) = (
                    self.controller.process_cursor_moved(position),
                    self.window.as_ref(),
                ) {
                    if let Err(e) = window.set_cursor_position(center) {
                        log::warn!("cursor warp failed: {}", e);
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("window resized to {}x{}", width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                self.controller.resized(PhysicalSize::new(width, height));
            }
            WindowEvent::CloseRequested => {
                self.controller.request_exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        self.controller.process_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release_scene();
        let frames = self
            .sequencer
            .as_ref()
            .map_or(0, |sequencer| sequencer.frames_presented());
        log::info!("exiting after {} frames", frames);
    }
}

/// Summary of a headless run
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub frames: u64,
    pub draw_calls: u64,
    pub vertices: u64,
    pub buffers_created: usize,
    pub buffers_released: usize,
    pub final_position: Point3<f32>,
}

/// Loads the scene into a [`RecordingBackend`] and runs `frames` frames of
/// forward motion at a fixed 60 Hz step, then releases the scene.
pub fn run_headless(config: &ViewerConfig, frames: u64) -> anyhow::Result<HeadlessReport> {
    const DT: f32 = 1.0 / 60.0;

    let mut backend = RecordingBackend::new();
    let registry = SceneRegistry::load(config.scene_specs(), &ObjImporter::new(), &mut backend)
        .context("failed to load scene")?;

    let mut sequencer = FrameSequencer::new(
        FlyCamera::new(config.camera),
        config.projection,
        config.render.clear_mask,
        (config.window.width, config.window.height),
    );
    let mut monitor = PerformanceMonitor::new();
    let mut draw_calls = 0u64;
    let mut vertices = 0u64;

    for _ in 0..frames {
        let outcome = sequencer
            .frame(&registry, &mut backend, &FrameInput::moving_forward(), DT)
            .context("frame failed")?;
        if let FrameOutcome::Presented(stats) = outcome {
            draw_calls += stats.draw_calls as u64;
            vertices += stats.vertices;
            monitor.record_frame(Duration::from_secs_f32(DT), &stats);
        }
    }

    registry
        .release(&mut backend)
        .context("failed to release scene")?;

    let report = HeadlessReport {
        frames: sequencer.frames_presented(),
        draw_calls,
        vertices,
        buffers_created: backend.count_calls(|c| matches!(c, BackendCall::CreateBuffer { .. })),
        buffers_released: backend.count_calls(|c| matches!(c, BackendCall::ReleaseBuffer(_))),
        final_position: sequencer.camera().state().position,
    };
    log::info!(
        "headless run: {} frames, {} draws, {} vertices, {}/{} buffers released, camera at ({:.2}, {:.2}, {:.2})",
        report.frames,
        report.draw_calls,
        report.vertices,
        report.buffers_released,
        report.buffers_created,
        report.final_position.x,
        report.final_position.y,
        report.final_position.z
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::StepMode;
    use cgmath::Vector3;

    #[test]
    fn test_headless_room_only() {
        let config = ViewerConfig::default().with_camera(
            crate::gfx::camera::CameraConfig::default().with_step(StepMode::PerFrame(0.05)),
        );
        let report = run_headless(&config, 20).unwrap();

        assert_eq!(report.frames, 20);
        assert_eq!(report.draw_calls, 120);
        assert_eq!(report.vertices, 20 * 24);
        assert_eq!(report.buffers_created, 6);
        assert_eq!(report.buffers_released, 6);
        // Default pose looks down -Z from z = 3.5.
        assert!((report.final_position.z - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_headless_missing_model_fails_cleanly() {
        let config = ViewerConfig::default()
            .with_model("/definitely/not/here.obj", Vector3::new(0.0, 0.0, 0.0));
        let err = run_headless(&config, 5).unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }
}
