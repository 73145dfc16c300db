// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The frame sequencer that drives any [`RenderBackend`](crate::gfx::backend::RenderBackend),
//! and the wgpu implementation of that backend.

pub mod frame;
pub mod pipeline;
pub mod render_engine;

// Re-export main types
pub use frame::{FrameOutcome, FrameSequencer, FrameStats, ProjectionConfig, ProjectionError};
pub use pipeline::PipelineConfig;
pub use render_engine::{RenderConfig, RenderEngine};
