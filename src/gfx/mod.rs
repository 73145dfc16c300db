//! # Graphics Module
//!
//! Everything between a loaded mesh and a presented frame.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - Bounding boxes and mesh normalization
//! - **Scene** ([`scene`]) - Mesh import, the procedural room and the scene registry
//! - **Camera** ([`camera`]) - Free-fly camera and per-frame input
//! - **Backend** ([`backend`]) - The rendering interface and a recording implementation
//! - **Rendering** ([`rendering`]) - Frame sequencing and the wgpu backend
//! - **Resources** ([`resources`]) - Uniform buffers, bind groups and depth textures
//!
//! Data flows one way each frame: input, camera, view matrix, frame sequencer,
//! backend draw calls over the registry's buffers.

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use backend::{RecordingBackend, RenderBackend};
pub use camera::FlyCamera;
pub use rendering::{FrameSequencer, RenderEngine};
pub use scene::SceneRegistry;
