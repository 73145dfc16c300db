//! Viewer configuration
//!
//! Plain structs with defaults and `with_*` builders. The binary fills them
//! from the command line; library users build them directly.

use cgmath::Vector3;

use crate::gfx::{
    camera::{CameraConfig, InputBindings, LookCapture},
    rendering::{ProjectionConfig, RenderConfig},
    scene::{default_room, ObjectSpec, RoomConfig},
};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "roomview".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Everything a viewer run needs
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub render: RenderConfig,
    pub room: RoomConfig,
    pub bindings: InputBindings,
    pub look_capture: LookCapture,
    /// Imported meshes, drawn after the room in this order
    pub models: Vec<ObjectSpec>,
}

impl ViewerConfig {
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionConfig) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_room(mut self, room: RoomConfig) -> Self {
        self.room = room;
        self
    }

    pub fn with_look_capture(mut self, capture: LookCapture) -> Self {
        self.look_capture = capture;
        self
    }

    /// Adds an imported mesh, named after the file stem.
    pub fn with_model(mut self, path: &str, placement: Vector3<f32>) -> Self {
        let stem = std::path::Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path);
        let name = format!("{}_{}", stem, self.models.len());
        self.models.push(ObjectSpec::imported(&name, path, placement));
        self
    }

    /// Room surfaces followed by the imported models.
    pub fn scene_specs(&self) -> Vec<ObjectSpec> {
        let mut specs = default_room(&self.room);
        specs.extend(self.models.iter().cloned());
        specs
    }

    /// Logs settings that are legal but probably unintended.
    pub fn warn_suspicious(&self) {
        if self.render.depth_test && !self.render.clear_mask.depth {
            log::warn!("depth testing is enabled but the depth buffer is never cleared");
        }
        if !self.render.clear_mask.color {
            log::warn!("color clear is disabled; previous frames will show through");
        }
    }
}
