// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Uniform buffers, bind groups and the depth texture used by the wgpu backend.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO};
pub use material::{MaterialBindings, MaterialUBO, MaterialUniform};
pub use texture_resource::TextureResource;
