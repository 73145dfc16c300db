//! # Scene Management Module
//!
//! Everything that ends up in a vertex buffer: imported furniture meshes, the
//! procedural room, and the registry that owns their backend handles.
//!
//! ## Key Components
//!
//! - [`SceneRegistry`] - Ordered, immutable set of drawable objects for one run
//! - [`ObjectSpec`] - Description of one object before it is loaded
//! - [`MeshImporter`] / [`ObjImporter`] - Mesh file loading
//! - [`default_room`] - Floor, ceiling and walls as quads
//! - [`Vertex3D`] - Position plus texture coordinates
//!
//! ## Usage
//!
//! ```no_run
//! use roomview::gfx::backend::RecordingBackend;
//! use roomview::gfx::scene::{default_room, ObjImporter, RoomConfig, SceneRegistry};
//!
//! let mut backend = RecordingBackend::new();
//! let specs = default_room(&RoomConfig::default());
//! let registry = SceneRegistry::load(specs, &ObjImporter::new(), &mut backend)?;
//! registry.release(&mut backend)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod import;
pub mod object;
pub mod room;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use import::{ImportError, ImportedMesh, MeshImporter, ObjImporter, SubMesh};
pub use object::{
    Material, ObjectSource, ObjectSpec, SceneObject, SurfacePattern, Topology, VertexLayout,
};
pub use room::{default_room, RoomConfig};
pub use scene::{SceneError, SceneRegistry, SceneStatistics};
pub use vertex::Vertex3D;
