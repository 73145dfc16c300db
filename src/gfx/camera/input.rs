//! Per-frame input snapshot consumed by the camera and the frame sequencer

use winit::{event::MouseButton, keyboard::KeyCode};

/// Everything the core reads from the user for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Look trigger held (pointer button)
    pub look: bool,
    /// Pointer displacement in pixels since the last frame, `(dx, dy)`
    pub look_delta: (f32, f32),
    /// New surface size, if the window was resized since the last frame
    pub resize: Option<(u32, u32)>,
    /// Terminates the frame loop
    pub exit: bool,
}

impl FrameInput {
    pub fn moving_forward() -> Self {
        Self {
            forward: true,
            ..Default::default()
        }
    }

    pub fn looking(dx: f32, dy: f32) -> Self {
        Self {
            look: true,
            look_delta: (dx, dy),
            ..Default::default()
        }
    }
}

/// Logical actions a key can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Exit,
}

/// Key and button bindings
#[derive(Debug, Clone, PartialEq)]
pub struct InputBindings {
    pub keys: Vec<(KeyCode, Action)>,
    pub look_button: MouseButton,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            keys: vec![
                (KeyCode::KeyW, Action::MoveForward),
                (KeyCode::ArrowUp, Action::MoveForward),
                (KeyCode::KeyS, Action::MoveBack),
                (KeyCode::ArrowDown, Action::MoveBack),
                (KeyCode::KeyA, Action::MoveLeft),
                (KeyCode::ArrowLeft, Action::MoveLeft),
                (KeyCode::KeyD, Action::MoveRight),
                (KeyCode::ArrowRight, Action::MoveRight),
                (KeyCode::Escape, Action::Exit),
            ],
            look_button: MouseButton::Left,
        }
    }
}

impl InputBindings {
    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.keys
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, action)| *action)
    }

    pub fn with_look_button(mut self, button: MouseButton) -> Self {
        self.look_button = button;
        self
    }
}

/// How pointer displacement is measured while looking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookCapture {
    /// Raw device motion deltas
    #[default]
    Relative,
    /// Cursor offset from the window center; the cursor is re-centered after each sample
    CenterWarp,
}
