//! # Frame Sequencer
//!
//! One frame is: advance the camera, push the view (and the projection when it
//! changed), clear, draw every registered object in registration order, present.
//! A draw failure aborts the frame; nothing is skipped or retried.

use cgmath::{perspective, Deg, Matrix4};
use thiserror::Error;

use crate::gfx::{
    backend::{BackendError, ClearMask, RenderBackend},
    camera::{FlyCamera, FrameInput},
    scene::SceneRegistry,
};

/// Rejected projection parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("field of view must be between 0 and 180 degrees, got {0}")]
    FieldOfView(f32),

    #[error("clip planes must satisfy 0 < near < far, got near {near} and far {far}")]
    ClipPlanes { near: f32, far: f32 },
}

/// Perspective parameters; only the aspect ratio changes at runtime.
///
/// Fields are only set through the checked builders, so [`matrix`](Self::matrix)
/// never hands `cgmath::perspective` values it rejects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    fovy: Deg<f32>,
    znear: f32,
    zfar: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fovy: Deg(45.0),
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl ProjectionConfig {
    pub fn with_fovy(mut self, fovy: Deg<f32>) -> Result<Self, ProjectionError> {
        if !(fovy.0 > 0.0 && fovy.0 < 180.0) {
            return Err(ProjectionError::FieldOfView(fovy.0));
        }
        self.fovy = fovy;
        Ok(self)
    }

    pub fn with_clip(mut self, znear: f32, zfar: f32) -> Result<Self, ProjectionError> {
        if !(znear > 0.0 && zfar > znear && zfar.is_finite()) {
            return Err(ProjectionError::ClipPlanes {
                near: znear,
                far: zfar,
            });
        }
        self.znear = znear;
        self.zfar = zfar;
        Ok(self)
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    pub fn clip(&self) -> (f32, f32) {
        (self.znear, self.zfar)
    }

    /// Zero dimensions are treated as one pixel.
    pub fn matrix(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        perspective(self.fovy, aspect, self.znear, self.zfar)
    }
}

/// Counters for one presented frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub draw_calls: u32,
    pub vertices: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented(FrameStats),
    /// The exit input was set; nothing was drawn
    Exit,
}

pub struct FrameSequencer {
    camera: FlyCamera,
    projection: ProjectionConfig,
    clear_mask: ClearMask,
    surface_size: (u32, u32),
    projection_sent: bool,
    frame_index: u64,
}

impl FrameSequencer {
    pub fn new(
        camera: FlyCamera,
        projection: ProjectionConfig,
        clear_mask: ClearMask,
        surface_size: (u32, u32),
    ) -> Self {
        Self {
            camera,
            projection,
            clear_mask,
            surface_size,
            projection_sent: false,
            frame_index: 0,
        }
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    pub fn frames_presented(&self) -> u64 {
        self.frame_index
    }

    /// Runs one frame against `backend`.
    pub fn frame<B: RenderBackend + ?Sized>(
        &mut self,
        registry: &SceneRegistry,
        backend: &mut B,
        input: &FrameInput,
        dt: f32,
    ) -> Result<FrameOutcome, BackendError> {
        if input.exit {
            log::info!("exit requested after {} frames", self.frame_index);
            return Ok(FrameOutcome::Exit);
        }

        self.camera.advance(input, dt);
        backend.set_view_transform(self.camera.view_matrix());

        let mut projection_dirty = !self.projection_sent;
        if let Some((width, height)) = input.resize {
            if width > 0 && height > 0 {
                log::debug!("surface resized to {}x{}", width, height);
                self.surface_size = (width, height);
                projection_dirty = true;
            }
        }
        if projection_dirty {
            let (width, height) = self.surface_size;
            backend.set_projection_transform(self.projection.matrix(width, height));
            self.projection_sent = true;
        }

        backend.clear(self.clear_mask)?;

        let mut stats = FrameStats {
            frame_index: self.frame_index,
            ..Default::default()
        };
        for object in registry.iter() {
            backend.draw(object.handle(), object.topology(), object.vertex_count())?;
            stats.draw_calls += 1;
            stats.vertices += object.vertex_count() as u64;
        }

        backend.present()?;
        self.frame_index += 1;

        Ok(FrameOutcome::Presented(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        backend::{BackendCall, RecordingBackend},
        camera::{CameraConfig, StepMode},
        scene::{import::tests::MemoryImporter, room::default_room, RoomConfig},
    };

    fn room_scene(backend: &mut RecordingBackend) -> SceneRegistry {
        let specs = default_room(&RoomConfig::default());
        SceneRegistry::load(specs, &MemoryImporter::default(), backend).unwrap()
    }

    fn sequencer() -> FrameSequencer {
        let camera = FlyCamera::new(CameraConfig::default().with_step(StepMode::PerFrame(0.1)));
        FrameSequencer::new(
            camera,
            ProjectionConfig::default(),
            ClearMask::COLOR_DEPTH,
            (800, 600),
        )
    }

    #[test]
    fn test_frame_draws_in_registration_order() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        backend.clear_calls();

        let mut seq = sequencer();
        let outcome = seq
            .frame(&registry, &mut backend, &FrameInput::default(), 0.016)
            .unwrap();

        let expected: Vec<_> = registry.iter().map(|o| o.handle()).collect();
        assert_eq!(backend.drawn_handles(), expected);
        assert_eq!(
            outcome,
            FrameOutcome::Presented(FrameStats {
                frame_index: 0,
                draw_calls: 6,
                vertices: 24,
            })
        );

        let calls = backend.calls();
        assert!(matches!(calls[0], BackendCall::SetView(_)));
        assert!(matches!(calls[1], BackendCall::SetProjection(_)));
        assert_eq!(calls[2], BackendCall::Clear(ClearMask::COLOR_DEPTH));
        assert_eq!(calls.last(), Some(&BackendCall::Present));
    }

    #[test]
    fn test_projection_sent_once_until_resize() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let mut seq = sequencer();

        for _ in 0..3 {
            seq.frame(&registry, &mut backend, &FrameInput::default(), 0.016)
                .unwrap();
        }
        let projections = backend.count_calls(|c| matches!(c, BackendCall::SetProjection(_)));
        assert_eq!(projections, 1);
        assert_eq!(seq.frames_presented(), 3);
    }

    #[test]
    fn test_resize_only_changes_projection() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let mut seq = sequencer();

        seq.frame(&registry, &mut backend, &FrameInput::default(), 0.016)
            .unwrap();
        let pose = *seq.camera().state();
        let view = backend.view();
        let projection = backend.projection();

        let resize = FrameInput {
            resize: Some((1600, 600)),
            ..Default::default()
        };
        seq.frame(&registry, &mut backend, &resize, 0.016).unwrap();

        assert_eq!(*seq.camera().state(), pose);
        assert_eq!(backend.view(), view);
        assert_ne!(backend.projection(), projection);
        assert_eq!(backend.projection(), ProjectionConfig::default().matrix(1600, 600));
    }

    #[test]
    fn test_zero_sized_resize_is_ignored() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let mut seq = sequencer();
        seq.frame(&registry, &mut backend, &FrameInput::default(), 0.016)
            .unwrap();

        let minimized = FrameInput {
            resize: Some((0, 0)),
            ..Default::default()
        };
        seq.frame(&registry, &mut backend, &minimized, 0.016).unwrap();

        assert_eq!(seq.surface_size(), (800, 600));
        let projections = backend.count_calls(|c| matches!(c, BackendCall::SetProjection(_)));
        assert_eq!(projections, 1);
    }

    #[test]
    fn test_exit_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        backend.clear_calls();

        let mut seq = sequencer();
        let exit = FrameInput {
            exit: true,
            forward: true,
            ..Default::default()
        };
        let outcome = seq.frame(&registry, &mut backend, &exit, 0.016).unwrap();

        assert_eq!(outcome, FrameOutcome::Exit);
        assert!(backend.calls().is_empty());
        assert_eq!(seq.camera().state().position, CameraConfig::default().start.position);
    }

    #[test]
    fn test_forward_motion_moves_view() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let mut seq = sequencer();
        let start = seq.camera().state().position;

        for _ in 0..10 {
            seq.frame(&registry, &mut backend, &FrameInput::moving_forward(), 0.016)
                .unwrap();
        }

        // Default yaw looks down -Z.
        let end = seq.camera().state().position;
        assert!((start.z - end.z - 1.0).abs() < 1e-4);
        assert_eq!(backend.view(), seq.camera().view_matrix());
    }

    #[test]
    fn test_draw_after_release_is_fatal() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let floor = registry.objects()[0].handle();
        backend.release_buffer(floor).unwrap();

        let mut seq = sequencer();
        let result = seq.frame(&registry, &mut backend, &FrameInput::default(), 0.016);

        assert!(matches!(result, Err(BackendError::UnknownBuffer(h)) if h == floor));
        assert_eq!(backend.count_calls(|c| *c == BackendCall::Present), 0);
    }

    #[test]
    fn test_configured_clear_mask_is_used() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let camera = FlyCamera::new(CameraConfig::default());
        let mut seq = FrameSequencer::new(
            camera,
            ProjectionConfig::default(),
            ClearMask::COLOR,
            (640, 480),
        );

        seq.frame(&registry, &mut backend, &FrameInput::default(), 0.016)
            .unwrap();
        assert_eq!(
            backend.count_calls(|c| *c == BackendCall::Clear(ClearMask::COLOR)),
            1
        );
    }

    #[test]
    fn test_projection_rejects_invalid_parameters() {
        let base = ProjectionConfig::default();

        for fovy in [0.0, -10.0, 180.0, 200.0, f32::NAN] {
            assert!(matches!(
                base.with_fovy(Deg(fovy)),
                Err(ProjectionError::FieldOfView(_))
            ));
        }
        assert!(matches!(
            base.with_clip(0.0, 10.0),
            Err(ProjectionError::ClipPlanes { .. })
        ));
        assert!(matches!(
            base.with_clip(5.0, 1.0),
            Err(ProjectionError::ClipPlanes { .. })
        ));

        let narrow = base.with_fovy(Deg(30.0)).unwrap().with_clip(0.5, 50.0).unwrap();
        assert_eq!(narrow.fovy(), Deg(30.0));
        assert_eq!(narrow.clip(), (0.5, 50.0));
    }

    #[test]
    fn test_zero_width_surface_still_projects() {
        let mut backend = RecordingBackend::new();
        let registry = room_scene(&mut backend);
        let camera = FlyCamera::new(CameraConfig::default());
        let mut seq = FrameSequencer::new(
            camera,
            ProjectionConfig::default(),
            ClearMask::COLOR_DEPTH,
            (0, 0),
        );

        let outcome = seq
            .frame(&registry, &mut backend, &FrameInput::default(), 0.016)
            .unwrap();
        assert!(matches!(outcome, FrameOutcome::Presented(_)));
    }
}
