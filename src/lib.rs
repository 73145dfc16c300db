// src/lib.rs
//! roomview
//!
//! A small real-time viewer: OBJ models normalized into a procedural room and
//! explored with a free-fly camera, rendered with wgpu and winit.

pub mod app;
pub mod config;
pub mod gfx;
pub mod performance;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{run_headless, ViewerApp};
pub use config::ViewerConfig;
