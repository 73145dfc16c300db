use std::path::PathBuf;

use cgmath::Vector3;

use crate::gfx::backend::BufferHandle;

use super::vertex::Vertex3D;

/// How a vertex buffer's points are grouped into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    QuadList,
}

impl Topology {
    pub fn vertices_per_primitive(&self) -> u32 {
        match self {
            Topology::TriangleList => 3,
            Topology::QuadList => 4,
        }
    }

    /// Whether `vertex_count` vertices form whole primitives
    pub fn accepts(&self, vertex_count: usize) -> bool {
        vertex_count > 0 && vertex_count % self.vertices_per_primitive() as usize == 0
    }

    pub fn primitive_count(&self, vertex_count: u32) -> u32 {
        vertex_count / self.vertices_per_primitive()
    }
}

/// Which vertex attributes carry real data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// Imported meshes: texture coordinates are zero
    PositionOnly,
    /// Procedural surfaces authored with texture coordinates
    PositionUv,
}

/// Surface pattern applied by the backend's fragment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePattern {
    Flat,
    /// Alternating tiles, one per texture-coordinate unit
    Checker,
}

/// Draw color and pattern for an object
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub pattern: SurfacePattern,
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            pattern: SurfacePattern::Flat,
        }
    }

    pub fn rgb(name: &str, r: f32, g: f32, b: f32) -> Self {
        Self::new(name, [r, g, b, 1.0])
    }

    pub fn with_pattern(mut self, pattern: SurfacePattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Color used for imported meshes without an explicit or MTL material
    pub fn furniture() -> Self {
        Self::rgb("furniture", 0.72, 0.45, 0.28)
    }
}

/// Where an object's vertices come from
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSource {
    /// Loaded through the mesh importer, normalized, then moved to `placement`
    Imported {
        path: PathBuf,
        placement: Vector3<f32>,
    },
    /// Authored in final world coordinates; never normalized
    Procedural {
        vertices: Vec<Vertex3D>,
        topology: Topology,
    },
}

/// Load-time description of one scene object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    pub source: ObjectSource,
    /// `None` lets imported meshes fall back to their MTL diffuse color
    pub material: Option<Material>,
}

impl ObjectSpec {
    pub fn imported(name: &str, path: impl Into<PathBuf>, placement: Vector3<f32>) -> Self {
        Self {
            name: name.to_string(),
            source: ObjectSource::Imported {
                path: path.into(),
                placement,
            },
            material: None,
        }
    }

    pub fn procedural(name: &str, vertices: Vec<Vertex3D>, topology: Topology) -> Self {
        Self {
            name: name.to_string(),
            source: ObjectSource::Procedural { vertices, topology },
            material: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }
}

/// A registered, immutable renderable
///
/// Created once by the scene registry; the backend buffer it references lives
/// until the registry is released.
#[derive(Debug)]
pub struct SceneObject {
    name: String,
    vertices: Vec<Vertex3D>,
    topology: Topology,
    layout: VertexLayout,
    placement: Vector3<f32>,
    material: Material,
    handle: BufferHandle,
}

impl SceneObject {
    pub(crate) fn new(
        name: String,
        vertices: Vec<Vertex3D>,
        topology: Topology,
        layout: VertexLayout,
        placement: Vector3<f32>,
        material: Material,
        handle: BufferHandle,
    ) -> Self {
        Self {
            name,
            vertices,
            topology,
            layout,
            placement,
            material,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn placement(&self) -> Vector3<f32> {
        self.placement
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_accepts_whole_primitives() {
        assert!(Topology::TriangleList.accepts(6));
        assert!(!Topology::TriangleList.accepts(4));
        assert!(Topology::QuadList.accepts(8));
        assert!(!Topology::QuadList.accepts(6));
        assert!(!Topology::QuadList.accepts(0));
    }

    #[test]
    fn test_primitive_count() {
        assert_eq!(Topology::TriangleList.primitive_count(9), 3);
        assert_eq!(Topology::QuadList.primitive_count(24), 6);
    }
}
