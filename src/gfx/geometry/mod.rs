//! # Geometry
//!
//! Pure vertex-set math shared by the scene loader.

pub mod normalize;

pub use normalize::{normalize, Aabb, NormalizationTransform, NormalizeError};
