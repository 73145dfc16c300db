pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;
pub mod input;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{CameraUniform, OPENGL_TO_WGPU_MATRIX};
pub use fly_camera::{update, CameraBasis, CameraConfig, CameraState, FlyCamera, StepMode, WORLD_UP};
pub use input::{Action, FrameInput, InputBindings, LookCapture};
