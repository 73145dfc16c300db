use cgmath::{Angle, Deg, InnerSpace, Matrix4, Point3, Vector3};

use super::input::FrameInput;

/// World up axis; the room floor lies in the XZ plane
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Camera pose
///
/// Yaw is unbounded and wraps through the trigonometry. Pitch is kept inside
/// the configured limit by [`update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3<f32>,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
}

impl Default for CameraState {
    fn default() -> Self {
        // Just inside the front wall, looking down -Z.
        Self {
            position: Point3::new(0.0, 0.5, 3.5),
            yaw: Deg(-90.0),
            pitch: Deg(0.0),
        }
    }
}

/// How far one active move axis travels in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepMode {
    /// Fixed distance per frame, independent of frame time
    PerFrame(f32),
    /// Units per second, scaled by the frame's elapsed time
    PerSecond(f32),
}

impl StepMode {
    pub fn distance(&self, dt: f32) -> f32 {
        match *self {
            StepMode::PerFrame(step) => step,
            StepMode::PerSecond(speed) => speed * dt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub step: StepMode,
    /// Degrees of rotation per pixel of pointer motion
    pub sensitivity: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]`
    pub pitch_limit: Deg<f32>,
    pub start: CameraState,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            step: StepMode::PerFrame(0.05),
            sensitivity: 0.1,
            pitch_limit: Deg(89.0),
            start: CameraState::default(),
        }
    }
}

impl CameraConfig {
    pub fn with_step(mut self, step: StepMode) -> Self {
        self.step = step;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_pitch_limit(mut self, limit: Deg<f32>) -> Self {
        self.pitch_limit = Deg(limit.0.abs());
        self
    }

    pub fn with_start(mut self, start: CameraState) -> Self {
        self.start = start;
        self
    }

    fn clamp_pitch(&self, pitch: Deg<f32>) -> Deg<f32> {
        Deg(pitch.0.clamp(-self.pitch_limit.0, self.pitch_limit.0))
    }
}

/// Orthonormal view basis derived from yaw and pitch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl CameraBasis {
    pub fn from_angles(yaw: Deg<f32>, pitch: Deg<f32>) -> Self {
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        let (sin_pitch, cos_pitch) = pitch.sin_cos();

        let forward =
            Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        let right = forward.cross(WORLD_UP).normalize();
        let up = right.cross(forward);

        Self { forward, right, up }
    }
}

impl CameraState {
    pub fn basis(&self) -> CameraBasis {
        CameraBasis::from_angles(self.yaw, self.pitch)
    }

    /// Look-at transform from the eye along the forward vector
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let forward = self.basis().forward;
        Matrix4::look_at_rh(self.position, self.position + forward, WORLD_UP)
    }
}

/// Advances the pose by one frame of input.
///
/// Movement uses the basis of the incoming pose; look input is applied after.
/// Simultaneous axes are summed without normalization, so diagonal travel is
/// faster than straight travel.
pub fn update(state: CameraState, input: &FrameInput, dt: f32, config: &CameraConfig) -> CameraState {
    let mut next = state;
    let basis = state.basis();
    let step = config.step.distance(dt);

    let mut travel = Vector3::new(0.0, 0.0, 0.0);
    if input.forward {
        travel += basis.forward * step;
    }
    if input.back {
        travel -= basis.forward * step;
    }
    if input.right {
        travel += basis.right * step;
    }
    if input.left {
        travel -= basis.right * step;
    }
    next.position += travel;

    if input.look {
        let (dx, dy) = input.look_delta;
        let yaw = next.yaw.0 + dx * config.sensitivity;
        let pitch = next.pitch.0 - dy * config.sensitivity;

        if yaw.is_finite() && pitch.is_finite() {
            next.yaw = Deg(yaw);
            next.pitch = config.clamp_pitch(Deg(pitch));
        } else {
            log::warn!("ignoring non-finite look input ({}, {})", dx, dy);
        }
    }

    next
}

/// Free-fly camera: the pose plus the configuration that drives it
///
/// The pose only changes through [`advance`](Self::advance), which applies
/// [`update`] once per frame.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    state: CameraState,
    config: CameraConfig,
}

impl FlyCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut state = config.start;
        state.pitch = config.clamp_pitch(state.pitch);
        Self { state, config }
    }

    pub fn advance(&mut self, input: &FrameInput, dt: f32) {
        self.state = update(self.state, input, dt, &self.config);
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn basis(&self) -> CameraBasis {
        self.state.basis()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.state.view_matrix()
    }
}
