//! # Mesh Import
//!
//! The scene registry only depends on [`MeshImporter`]. The production
//! implementation, [`ObjImporter`], reads Wavefront OBJ files through `tobj`,
//! triangulates them and expands the index buffer into a flat triangle list in
//! the file's authored winding order.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures while reading a mesh asset
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("mesh file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported mesh format '{extension}' for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("corrupt mesh file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("mesh file {} contains no faces", path.display())]
    NoGeometry { path: PathBuf },
}

/// One named group of triangle vertex positions
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub name: String,
    /// Flat triangle list; every three positions form one triangle
    pub positions: Vec<[f32; 3]>,
}

/// Result of importing one asset
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMesh {
    pub submeshes: Vec<SubMesh>,
    /// Diffuse color of the first sub-mesh's material, when the asset has one
    pub diffuse: Option<[f32; 3]>,
}

impl ImportedMesh {
    /// All sub-meshes as one position stream, in sub-mesh order
    pub fn flatten(&self) -> Vec<[f32; 3]> {
        self.submeshes
            .iter()
            .flat_map(|m| m.positions.iter().copied())
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(|m| m.positions.len()).sum()
    }
}

/// Source of raw mesh geometry
pub trait MeshImporter {
    fn import(&self, path: &Path) -> Result<ImportedMesh, ImportError>;
}

/// Wavefront OBJ importer backed by `tobj`
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

impl ObjImporter {
    pub fn new() -> Self {
        Self
    }
}

impl MeshImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<ImportedMesh, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if !extension.eq_ignore_ascii_case("obj") {
            return Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            });
        }

        if !path.is_file() {
            return Err(ImportError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| ImportError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let materials = materials.unwrap_or_else(|e| {
            log::debug!("no MTL materials for {}: {}", path.display(), e);
            Vec::new()
        });

        let diffuse = models
            .iter()
            .find(|m| !m.mesh.indices.is_empty())
            .and_then(|m| m.mesh.material_id)
            .and_then(|id| materials.get(id))
            .and_then(|mtl| mtl.diffuse);

        // tobj always yields a trailing model, even for a file with no faces.
        let mut submeshes = Vec::with_capacity(models.len());
        for model in models.iter().filter(|m| !m.mesh.indices.is_empty()) {
            let positions = expand_indices(&model.mesh.positions, &model.mesh.indices)
                .ok_or_else(|| ImportError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("index out of range in sub-mesh '{}'", model.name),
                })?;

            submeshes.push(SubMesh {
                name: model.name.clone(),
                positions,
            });
        }

        if submeshes.is_empty() {
            return Err(ImportError::NoGeometry {
                path: path.to_path_buf(),
            });
        }

        let mesh = ImportedMesh { submeshes, diffuse };
        log::info!(
            "imported {}: {} sub-meshes, {} vertices",
            path.display(),
            mesh.submeshes.len(),
            mesh.vertex_count()
        );

        Ok(mesh)
    }
}

/// Turns an indexed mesh into a flat list, one position per index.
fn expand_indices(positions: &[f32], indices: &[u32]) -> Option<Vec<[f32; 3]>> {
    indices
        .iter()
        .map(|&i| {
            let base = i as usize * 3;
            let p = positions.get(base..base + 3)?;
            Some([p[0], p[1], p[2]])
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{collections::HashMap, io::Write};

    /// Importer serving meshes from memory, keyed by path
    #[derive(Default)]
    pub(crate) struct MemoryImporter {
        meshes: HashMap<PathBuf, ImportedMesh>,
    }

    impl MemoryImporter {
        pub(crate) fn with_mesh(mut self, path: &str, positions: Vec<[f32; 3]>) -> Self {
            self.meshes.insert(
                PathBuf::from(path),
                ImportedMesh {
                    submeshes: vec![SubMesh {
                        name: path.to_string(),
                        positions,
                    }],
                    diffuse: None,
                },
            );
            self
        }
    }

    impl MeshImporter for MemoryImporter {
        fn import(&self, path: &Path) -> Result<ImportedMesh, ImportError> {
            self.meshes
                .get(path)
                .cloned()
                .ok_or_else(|| ImportError::NotFound {
                    path: path.to_path_buf(),
                })
        }
    }

    /// Writes an OBJ file that is deleted when the handle drops.
    fn obj_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("roomview-")
            .suffix(".obj")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_expand_indices() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let out = expand_indices(&positions, &[0, 1, 2, 2, 1, 0]).unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(out[3], [0.0, 1.0, 0.0]);
        assert!(expand_indices(&positions, &[0, 1, 7]).is_none());
    }

    #[test]
    fn test_obj_quad_is_triangulated() {
        let file = obj_file("o quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        let mesh = ObjImporter::new().import(file.path()).unwrap();

        assert_eq!(mesh.submeshes.len(), 1);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.flatten()[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_file() {
        let result = ObjImporter::new().import(Path::new("/definitely/not/here.obj"));
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ObjImporter::new().import(Path::new("chair.fbx"));
        assert!(matches!(
            result,
            Err(ImportError::UnsupportedFormat { extension, .. }) if extension == "fbx"
        ));
    }

    #[test]
    fn test_malformed_position_is_corrupt() {
        let file = obj_file("o broken\nv 0 0 0\nv 1 abc 0\nv 0 1 0\nf 1 2 3\n");
        let result = ObjImporter::new().import(file.path());
        assert!(matches!(result, Err(ImportError::Corrupt { .. })));
    }

    #[test]
    fn test_file_without_faces_has_no_geometry() {
        let importer = ObjImporter::new();

        let empty = obj_file("# exported from an empty scene\n");
        let result = importer.import(empty.path());
        assert!(matches!(result, Err(ImportError::NoGeometry { .. })));

        let points = obj_file("o cloud\nv 0 0 0\nv 1 0 0\nv 0 1 0\n");
        let result = importer.import(points.path());
        assert!(matches!(result, Err(ImportError::NoGeometry { .. })));
    }
}
