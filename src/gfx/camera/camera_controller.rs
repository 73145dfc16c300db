use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input::{Action, FrameInput, InputBindings, LookCapture};

/// Collects winit events between frames and hands them out as one [`FrameInput`].
///
/// Held keys persist across frames. Pointer motion, resizes and the exit
/// request are consumed by [`take_frame_input`](Self::take_frame_input).
pub struct CameraController {
    bindings: InputBindings,
    capture: LookCapture,
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    look: bool,
    look_delta: (f32, f32),
    resize: Option<(u32, u32)>,
    exit: bool,
    window_size: PhysicalSize<u32>,
}

impl CameraController {
    pub fn new(bindings: InputBindings, capture: LookCapture) -> Self {
        Self {
            bindings,
            capture,
            forward: false,
            back: false,
            left: false,
            right: false,
            look: false,
            look_delta: (0.0, 0.0),
            resize: None,
            exit: false,
            window_size: PhysicalSize::new(0, 0),
        }
    }

    pub fn capture(&self) -> LookCapture {
        self.capture
    }

    pub fn is_looking(&self) -> bool {
        self.look
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(key) = event.physical_key {
            self.process_key(key, event.state);
        }
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match self.bindings.action_for(key) {
            Some(Action::MoveForward) => self.forward = pressed,
            Some(Action::MoveBack) => self.back = pressed,
            Some(Action::MoveLeft) => self.left = pressed,
            Some(Action::MoveRight) => self.right = pressed,
            Some(Action::Exit) => self.exit |= pressed,
            None => (),
        }
    }

    /// Returns true when the look trigger changed state.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        if button != self.bindings.look_button {
            return false;
        }
        let pressed = state == ElementState::Pressed;
        let changed = self.look != pressed;
        self.look = pressed;
        if !pressed {
            self.look_delta = (0.0, 0.0);
        }
        changed
    }

    /// Raw device motion, used in [`LookCapture::Relative`] mode.
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if self.capture != LookCapture::Relative || !self.look {
            return;
        }
        if let DeviceEvent::MouseMotion { delta } = event {
            self.look_delta.0 += delta.0 as f32;
            self.look_delta.1 += delta.1 as f32;
        }
    }

    /// Cursor position, used in [`LookCapture::CenterWarp`] mode.
    ///
    /// Returns the window center the cursor should be warped back to, if any.
    pub fn process_cursor_moved(
        &mut self,
        position: PhysicalPosition<f64>,
    ) -> Option<PhysicalPosition<f64>> {
        if self.capture != LookCapture::CenterWarp || !self.look {
            return None;
        }
        let center = self.window_center();
        let dx = (position.x - center.x) as f32;
        let dy = (position.y - center.y) as f32;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        self.look_delta.0 += dx;
        self.look_delta.1 += dy;
        Some(center)
    }

    pub fn resized(&mut self, size: PhysicalSize<u32>) {
        self.window_size = size;
        self.resize = Some((size.width, size.height));
    }

    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn window_center(&self) -> PhysicalPosition<f64> {
        PhysicalPosition::new(
            self.window_size.width as f64 / 2.0,
            self.window_size.height as f64 / 2.0,
        )
    }

    /// Snapshot for the next frame; clears the per-frame accumulators.
    pub fn take_frame_input(&mut self) -> FrameInput {
        let input = FrameInput {
            forward: self.forward,
            back: self.back,
            left: self.left,
            right: self.right,
            look: self.look,
            look_delta: self.look_delta,
            resize: self.resize.take(),
            exit: self.exit,
        };
        self.look_delta = (0.0, 0.0);
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(capture: LookCapture) -> CameraController {
        let mut c = CameraController::new(InputBindings::default(), capture);
        c.resized(PhysicalSize::new(800, 600));
        c.take_frame_input();
        c
    }

    #[test]
    fn test_held_keys_persist() {
        let mut c = controller(LookCapture::Relative);
        c.process_key(KeyCode::KeyW, ElementState::Pressed);
        c.process_key(KeyCode::ArrowLeft, ElementState::Pressed);

        assert!(c.take_frame_input().forward);
        let second = c.take_frame_input();
        assert!(second.forward && second.left);

        c.process_key(KeyCode::KeyW, ElementState::Released);
        assert!(!c.take_frame_input().forward);
    }

    #[test]
    fn test_motion_ignored_without_look() {
        let mut c = controller(LookCapture::Relative);
        c.process_device_event(&DeviceEvent::MouseMotion { delta: (4.0, 2.0) });
        assert_eq!(c.take_frame_input().look_delta, (0.0, 0.0));
    }

    #[test]
    fn test_relative_motion_accumulates_then_resets() {
        let mut c = controller(LookCapture::Relative);
        assert!(c.process_mouse_button(MouseButton::Left, ElementState::Pressed));
        c.process_device_event(&DeviceEvent::MouseMotion { delta: (4.0, 2.0) });
        c.process_device_event(&DeviceEvent::MouseMotion { delta: (1.0, -5.0) });

        let input = c.take_frame_input();
        assert!(input.look);
        assert_eq!(input.look_delta, (5.0, -3.0));
        assert_eq!(c.take_frame_input().look_delta, (0.0, 0.0));
    }

    #[test]
    fn test_center_warp_measures_from_center() {
        let mut c = controller(LookCapture::CenterWarp);
        c.process_mouse_button(MouseButton::Left, ElementState::Pressed);

        let warp = c.process_cursor_moved(PhysicalPosition::new(410.0, 290.0));
        assert_eq!(warp, Some(PhysicalPosition::new(400.0, 300.0)));
        assert_eq!(c.process_cursor_moved(PhysicalPosition::new(400.0, 300.0)), None);
        assert_eq!(c.take_frame_input().look_delta, (10.0, -10.0));
    }

    #[test]
    fn test_resize_and_exit_are_reported() {
        let mut c = controller(LookCapture::Relative);
        c.resized(PhysicalSize::new(1024, 768));
        c.process_key(KeyCode::Escape, ElementState::Pressed);

        let input = c.take_frame_input();
        assert_eq!(input.resize, Some((1024, 768)));
        assert!(input.exit);
        assert_eq!(c.take_frame_input().resize, None);
    }

    #[test]
    fn test_other_buttons_do_not_look() {
        let mut c = controller(LookCapture::Relative);
        assert!(!c.process_mouse_button(MouseButton::Right, ElementState::Pressed));
        assert!(!c.take_frame_input().look);
    }
}
