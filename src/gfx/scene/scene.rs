use cgmath::{Vector3, Zero};
use thiserror::Error;

use crate::gfx::{
    backend::{BackendError, RenderBackend},
    geometry::{normalize, NormalizeError},
};

use super::{
    import::{ImportError, MeshImporter},
    object::{Material, ObjectSource, ObjectSpec, SceneObject, Topology, VertexLayout},
    vertex::Vertex3D,
};

/// Load-time failures, tagged with the object that caused them
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to import '{name}': {source}")]
    Import {
        name: String,
        #[source]
        source: ImportError,
    },

    #[error("failed to normalize '{name}': {source}")]
    Normalize {
        name: String,
        #[source]
        source: NormalizeError,
    },

    #[error("'{name}' has {vertex_count} vertices, which is not a whole {topology:?}")]
    Topology {
        name: String,
        vertex_count: usize,
        topology: Topology,
    },

    #[error("failed to register '{name}' with the backend: {source}")]
    Backend {
        name: String,
        #[source]
        source: BackendError,
    },
}

/// Vertex data resolved from a spec, ready for registration
struct ResolvedObject {
    vertices: Vec<Vertex3D>,
    topology: Topology,
    layout: VertexLayout,
    placement: Vector3<f32>,
    material: Material,
}

/// The closed set of renderable objects for one run
///
/// Objects are kept in registration order, which is also draw order. Nothing can
/// be added or changed after [`load`](Self::load); the only way to give the
/// backend buffers back is [`release`](Self::release), which consumes the registry.
#[derive(Debug)]
pub struct SceneRegistry {
    objects: Vec<SceneObject>,
}

impl SceneRegistry {
    /// Builds every object in `specs` and uploads it to the backend.
    ///
    /// Imported meshes go through the normalizer; procedural geometry is used
    /// as authored. If any object fails, buffers created for earlier objects
    /// are released before the error is returned.
    pub fn load<B, I>(
        specs: Vec<ObjectSpec>,
        importer: &I,
        backend: &mut B,
    ) -> Result<Self, SceneError>
    where
        B: RenderBackend + ?Sized,
        I: MeshImporter + ?Sized,
    {
        let mut registry = SceneRegistry {
            objects: Vec::with_capacity(specs.len()),
        };

        for spec in specs {
            let result = match resolve(&spec, importer) {
                Ok(resolved) => registry.register(spec.name.clone(), resolved, backend),
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                log::error!("scene load aborted at '{}': {}", spec.name, e);
                if let Err(release_err) = registry.release(backend) {
                    log::error!("while unwinding partial scene: {}", release_err);
                }
                return Err(e);
            }
        }

        if registry.objects.is_empty() {
            log::warn!("scene registry is empty; only the clear color will be shown");
        }

        let stats = registry.statistics();
        log::info!(
            "scene loaded: {} objects, {} vertices, {} primitives",
            stats.object_count,
            stats.total_vertices,
            stats.total_primitives
        );

        Ok(registry)
    }

    /// The single registration path shared by every object kind
    fn register<B: RenderBackend + ?Sized>(
        &mut self,
        name: String,
        resolved: ResolvedObject,
        backend: &mut B,
    ) -> Result<(), SceneError> {
        if !resolved.topology.accepts(resolved.vertices.len()) {
            return Err(SceneError::Topology {
                name,
                vertex_count: resolved.vertices.len(),
                topology: resolved.topology,
            });
        }

        let handle = backend
            .create_buffer(&name, &resolved.vertices, &resolved.material)
            .map_err(|source| SceneError::Backend {
                name: name.clone(),
                source,
            })?;

        log::debug!(
            "registered '{}' as buffer {} ({} vertices, {:?}, {:?})",
            name,
            handle,
            resolved.vertices.len(),
            resolved.topology,
            resolved.layout
        );

        self.objects.push(SceneObject::new(
            name,
            resolved.vertices,
            resolved.topology,
            resolved.layout,
            resolved.placement,
            resolved.material,
            handle,
        ));
        Ok(())
    }

    /// Objects in draw order
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            total_vertices: self
                .objects
                .iter()
                .map(|o| o.vertex_count() as u64)
                .sum(),
            total_primitives: self
                .objects
                .iter()
                .map(|o| o.topology().primitive_count(o.vertex_count()) as u64)
                .sum(),
        }
    }

    /// Releases every backend buffer owned by the registry.
    ///
    /// All buffers are attempted even if one fails; the first failure is returned.
    pub fn release<B: RenderBackend + ?Sized>(self, backend: &mut B) -> Result<(), BackendError> {
        let mut first_error = None;

        for object in &self.objects {
            if let Err(e) = backend.release_buffer(object.handle()) {
                log::error!("failed to release '{}': {}", object.name(), e);
                first_error.get_or_insert(e);
            }
        }

        log::info!("released {} scene buffers", self.objects.len());

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn resolve<I: MeshImporter + ?Sized>(
    spec: &ObjectSpec,
    importer: &I,
) -> Result<ResolvedObject, SceneError> {
    match &spec.source {
        ObjectSource::Imported { path, placement } => {
            let mesh = importer.import(path).map_err(|source| SceneError::Import {
                name: spec.name.clone(),
                source,
            })?;

            let positions =
                normalize(&mesh.flatten(), *placement).map_err(|source| SceneError::Normalize {
                    name: spec.name.clone(),
                    source,
                })?;

            let material = spec.material.clone().unwrap_or_else(|| match mesh.diffuse {
                Some([r, g, b]) => Material::rgb(&spec.name, r, g, b),
                None => Material::furniture(),
            });

            Ok(ResolvedObject {
                vertices: positions.into_iter().map(Vertex3D::from_position).collect(),
                topology: Topology::TriangleList,
                layout: VertexLayout::PositionOnly,
                placement: *placement,
                material,
            })
        }
        ObjectSource::Procedural { vertices, topology } => Ok(ResolvedObject {
            vertices: vertices.clone(),
            topology: *topology,
            layout: VertexLayout::PositionUv,
            placement: Vector3::zero(),
            material: spec
                .material
                .clone()
                .unwrap_or_else(|| Material::rgb(&spec.name, 0.8, 0.8, 0.8)),
        }),
    }
}

/// Scene statistics for logging and the headless report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub total_vertices: u64,
    pub total_primitives: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        backend::{BackendCall, RecordingBackend},
        geometry::Aabb,
        scene::{
            import::tests::MemoryImporter,
            room::{default_room, RoomConfig},
        },
    };

    fn tetrahedron_at(offset: f32) -> Vec<[f32; 3]> {
        let a = [offset, offset, offset];
        let b = [offset + 4.0, offset, offset];
        let c = [offset, offset + 2.0, offset];
        let d = [offset, offset, offset + 1.0];
        vec![a, b, c, a, c, d, a, d, b, b, d, c]
    }

    fn scene_specs() -> Vec<ObjectSpec> {
        let mut specs = default_room(&RoomConfig::default());
        specs.push(ObjectSpec::imported(
            "couch",
            "couch.obj",
            Vector3::new(0.0, 0.0, -2.0),
        ));
        specs.push(ObjectSpec::imported(
            "table",
            "table.obj",
            Vector3::new(2.0, 0.0, 0.0),
        ));
        specs
    }

    fn importer() -> MemoryImporter {
        MemoryImporter::default()
            .with_mesh("couch.obj", tetrahedron_at(10.0))
            .with_mesh("table.obj", tetrahedron_at(-3.0))
    }

    #[test]
    fn test_registration_order_is_draw_order() {
        let mut backend = RecordingBackend::new();
        let registry = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap();

        let names: Vec<&str> = registry.iter().map(|o| o.name()).collect();
        assert_eq!(
            names,
            [
                "floor",
                "ceiling",
                "wall_back",
                "wall_front",
                "wall_left",
                "wall_right",
                "couch",
                "table"
            ]
        );
        assert_eq!(backend.live_buffer_count(), 8);
    }

    #[test]
    fn test_imported_objects_are_normalized_and_placed() {
        let mut backend = RecordingBackend::new();
        let registry = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap();

        let couch = registry.get("couch").unwrap();
        assert_eq!(couch.layout(), VertexLayout::PositionOnly);
        assert_eq!(couch.topology(), Topology::TriangleList);

        let positions: Vec<[f32; 3]> = couch.vertices().iter().map(|v| v.position).collect();
        let aabb = Aabb::from_vertices(&positions).unwrap();
        assert!((aabb.max_extent() - 1.0).abs() < 1e-5);
        let center = aabb.center();
        assert!(center.x.abs() < 1e-5);
        assert!(center.y.abs() < 1e-5);
        assert!((center.z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_procedural_objects_skip_normalization() {
        let mut backend = RecordingBackend::new();
        let registry = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap();

        let floor = registry.get("floor").unwrap();
        assert_eq!(floor.layout(), VertexLayout::PositionUv);
        assert_eq!(floor.vertices()[1].position, [5.0, -0.5, 5.0]);
    }

    #[test]
    fn test_release_frees_every_buffer_once() {
        let mut backend = RecordingBackend::new();
        let registry = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap();
        let handles: Vec<_> = registry.iter().map(|o| o.handle()).collect();

        backend.clear_calls();
        registry.release(&mut backend).unwrap();

        assert_eq!(backend.live_buffer_count(), 0);
        for handle in handles {
            let releases = backend.count_calls(|c| *c == BackendCall::ReleaseBuffer(handle));
            assert_eq!(releases, 1);
        }
    }

    #[test]
    fn test_missing_asset_aborts_and_unwinds() {
        let mut backend = RecordingBackend::new();
        let importer = MemoryImporter::default().with_mesh("couch.obj", tetrahedron_at(0.0));

        let err = SceneRegistry::load(scene_specs(), &importer, &mut backend).unwrap_err();
        assert!(matches!(err, SceneError::Import { ref name, .. } if name == "table"));
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_degenerate_asset_aborts() {
        let mut backend = RecordingBackend::new();
        let importer = importer().with_mesh("table.obj", vec![[1.0, 1.0, 1.0]; 3]);

        let err = SceneRegistry::load(scene_specs(), &importer, &mut backend).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Normalize {
                source: NormalizeError::DegenerateMesh { .. },
                ..
            }
        ));
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_backend_failure_unwinds() {
        let mut backend = RecordingBackend::new().with_buffer_limit(3);
        let err = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap_err();

        assert!(matches!(err, SceneError::Backend { ref name, .. } if name == "wall_front"));
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_partial_quad_is_rejected() {
        let specs = vec![ObjectSpec::procedural(
            "broken",
            vec![Vertex3D::from_position([0.0; 3]); 6],
            Topology::QuadList,
        )];
        let mut backend = RecordingBackend::new();
        let err = SceneRegistry::load(specs, &importer(), &mut backend).unwrap_err();
        assert!(matches!(err, SceneError::Topology { vertex_count: 6, .. }));
    }

    #[test]
    fn test_statistics() {
        let mut backend = RecordingBackend::new();
        let registry = SceneRegistry::load(scene_specs(), &importer(), &mut backend).unwrap();
        let stats = registry.statistics();

        assert_eq!(stats.object_count, 8);
        assert_eq!(stats.total_vertices, 6 * 4 + 2 * 12);
        assert_eq!(stats.total_primitives, 6 + 2 * 4);
    }
}
