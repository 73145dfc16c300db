//! # Mesh Normalization
//!
//! Every imported mesh is brought into its own unit cube before it is placed in
//! the room: the axis-aligned bounding box is centered on the origin and the
//! largest extent is scaled to exactly one world unit. The placement offset is
//! added afterwards.
//!
//! ```text
//! out = (in - center) * scale + placement
//! ```
//!
//! Normalization is a pure function of `(vertices, placement)`; no state is
//! shared between meshes.

use cgmath::Vector3;
use thiserror::Error;

/// Errors raised while canonicalizing a mesh
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    /// The vertex stream contained no positions at all
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// Zero extent on every axis, a non-finite coordinate, or a box too large for `f32`
    #[error("mesh is degenerate: largest extent {extent} gives no usable scale")]
    DegenerateMesh { extent: f32 },
}

/// Axis-aligned bounding box over a vertex set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Computes the bounding box of a vertex set.
    ///
    /// Returns `None` for an empty set instead of a box built from sentinel values.
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = vertices.split_first()?;

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in rest {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Some(Self::new(min, max))
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) / 2.0
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Length of the longest axis
    pub fn max_extent(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }
}

/// Centering translation and uniform scale derived from one mesh's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationTransform {
    pub center: Vector3<f32>,
    pub scale: f32,
}

impl NormalizationTransform {
    /// Derives the transform for a bounding box.
    ///
    /// The extent, center and scale must all be finite and the scale non-zero,
    /// otherwise the largest output extent could not be one.
    pub fn from_bounds(bounds: &Aabb) -> Result<Self, NormalizeError> {
        let extent = bounds.max_extent();
        let center = bounds.center();
        let scale = 1.0 / extent;

        let usable = extent > 0.0
            && extent.is_finite()
            && scale.is_finite()
            && scale > 0.0
            && is_finite(center);
        if !usable {
            return Err(NormalizeError::DegenerateMesh { extent });
        }

        Ok(Self { center, scale })
    }

    /// Maps a local-space vertex into world space.
    pub fn apply(&self, vertex: [f32; 3], placement: Vector3<f32>) -> [f32; 3] {
        ((Vector3::from(vertex) - self.center) * self.scale + placement).into()
    }

    /// Inverse of [`apply`](Self::apply) for the same placement.
    pub fn invert(&self, vertex: [f32; 3], placement: Vector3<f32>) -> [f32; 3] {
        ((Vector3::from(vertex) - placement) / self.scale + self.center).into()
    }
}

/// Normalizes a mesh into its unit cube and moves it to `placement`.
///
/// The output has the same length and order as the input.
pub fn normalize(
    vertices: &[[f32; 3]],
    placement: Vector3<f32>,
) -> Result<Vec<[f32; 3]>, NormalizeError> {
    let bounds = Aabb::from_vertices(vertices).ok_or(NormalizeError::EmptyMesh)?;
    // f32::min/max skip NaN, so the box alone cannot reveal a bad coordinate.
    if let Some(index) = vertices.iter().position(|v| v.iter().any(|c| !c.is_finite())) {
        log::debug!("vertex {} has a non-finite coordinate: {:?}", index, vertices[index]);
        return Err(NormalizeError::DegenerateMesh { extent: f32::NAN });
    }
    let transform = NormalizationTransform::from_bounds(&bounds)?;

    log::debug!(
        "normalizing {} vertices: center {:?}, scale {}",
        vertices.len(),
        transform.center,
        transform.scale
    );

    Ok(vertices
        .iter()
        .map(|&v| transform.apply(v, placement))
        .collect())
}

fn is_finite(v: Vector3<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
