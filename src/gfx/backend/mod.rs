//! # Rendering Backend Interface
//!
//! The narrow surface through which the scene registry and the frame sequencer
//! talk to the GPU. Everything else (pipelines, shaders, depth buffers, surface
//! management) is backend-internal setup.
//!
//! Two implementations ship with the crate:
//!
//! - [`RenderEngine`](crate::gfx::rendering::RenderEngine) drives wgpu
//! - [`RecordingBackend`] keeps every call in memory for headless runs and tests

pub mod recording;

pub use recording::{BackendCall, RecordingBackend};

use std::fmt;

use cgmath::Matrix4;
use thiserror::Error;

use crate::gfx::scene::{
    object::{Material, Topology},
    vertex::Vertex3D,
};

/// Opaque reference to a vertex buffer owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which attachments are cleared at the start of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };

    pub const COLOR_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

impl Default for ClearMask {
    fn default() -> Self {
        Self::COLOR_DEPTH
    }
}

/// Buffer creation, draw and presentation failures
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("buffer {0} is not live (never created or already released)")]
    UnknownBuffer(BufferHandle),

    #[error("refusing to create empty buffer '{label}'")]
    EmptyBuffer { label: String },

    #[error("failed to create buffer '{label}': {reason}")]
    BufferCreation { label: String, reason: String },

    #[error("draw of {requested} vertices from buffer {handle} exceeds its {available} vertices")]
    VertexCountMismatch {
        handle: BufferHandle,
        requested: u32,
        available: u32,
    },

    #[error("quad index buffer holds {capacity} quads but {quads} were drawn")]
    QuadIndicesMissing { quads: u32, capacity: u32 },

    #[error("no frame in progress; clear() must precede draw() and present()")]
    FrameNotStarted,

    #[error("clear() called while a frame is already in progress")]
    FrameAlreadyStarted,

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable graphics adapter: {0}")]
    AdapterUnavailable(String),

    #[error("failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Operations the core needs from a graphics backend
///
/// All calls happen on the render thread. A frame is `clear`, any number of
/// `draw`s, then `present`.
pub trait RenderBackend {
    /// Uploads a vertex buffer and returns a handle to it.
    fn create_buffer(
        &mut self,
        label: &str,
        vertices: &[Vertex3D],
        material: &Material,
    ) -> Result<BufferHandle, BackendError>;

    /// Frees a buffer. The handle is invalid afterwards.
    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError>;

    /// Draws the first `vertex_count` vertices of a buffer.
    fn draw(
        &mut self,
        handle: BufferHandle,
        topology: Topology,
        vertex_count: u32,
    ) -> Result<(), BackendError>;

    fn set_view_transform(&mut self, view: Matrix4<f32>);

    fn set_projection_transform(&mut self, projection: Matrix4<f32>);

    /// Begins a frame, clearing the attachments selected by `mask`.
    fn clear(&mut self, mask: ClearMask) -> Result<(), BackendError>;

    /// Finishes the frame and shows it.
    fn present(&mut self) -> Result<(), BackendError>;
}
