//! Mesh I/O: the file import adapter and the diagnostic writer.
//!
//! Importers turn a mesh file into raw node/element arrays ([`ImportedMesh`]);
//! [`crate::mesh::Mesh::create_from_file`] validates and links them exactly
//! like the in-memory build path.

pub mod gmsh;
pub mod vtk;

use crate::data::element_table::ElementFields;
use crate::mesh::options::{FileFormat, ImportOptions};
use crate::mesh_error::{Advisory, MeshError};
use crate::topology::element_type::ElementType;
use std::path::Path;

/// Raw mesh arrays produced by an importer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    /// Coordinate components per node.
    pub spatial_dim: usize,
    pub node_ids: Vec<i64>,
    /// Interleaved, `spatial_dim` values per node.
    pub node_coords: Vec<f64>,
    pub node_owners: Vec<usize>,
    pub node_mask: Option<Vec<i32>>,
    pub element_ids: Vec<i64>,
    pub element_types: Vec<ElementType>,
    pub connectivity: Vec<i64>,
    pub element_fields: ElementFields,
    /// Non-fatal notices raised while reading.
    pub advisories: Vec<Advisory>,
}

impl ImportedMesh {
    /// Topological dimension implied by the element types, or the coordinate
    /// dimension for an element-less import.
    pub fn inferred_parametric_dim(&self) -> usize {
        self.element_types
            .iter()
            .map(|t| t.dimension())
            .max()
            .unwrap_or(self.spatial_dim)
    }
}

/// Trait for readers that turn a mesh file into raw arrays.
pub trait MeshImporter {
    /// Whether this importer can read `format` at all.
    fn supports(&self, format: FileFormat) -> bool;

    /// Read the mesh stored at `path`.
    fn import_mesh(
        &self,
        path: &Path,
        format: FileFormat,
        options: &ImportOptions,
    ) -> Result<ImportedMesh, MeshError>;
}

/// Importer that supports no format; for in-memory only configurations.
#[derive(Debug, Default, Clone)]
pub struct NoImporter;

impl MeshImporter for NoImporter {
    fn supports(&self, _format: FileFormat) -> bool {
        false
    }

    fn import_mesh(
        &self,
        _path: &Path,
        format: FileFormat,
        _options: &ImportOptions,
    ) -> Result<ImportedMesh, MeshError> {
        Err(unsupported_format(format))
    }
}

pub(crate) fn unsupported_format(format: FileFormat) -> MeshError {
    MeshError::Configuration(format!("no importer available for {format:?} files"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parametric_dim_comes_from_element_types() {
        let mesh = ImportedMesh {
            spatial_dim: 3,
            element_types: vec![ElementType::Triangle, ElementType::Quadrilateral],
            ..ImportedMesh::default()
        };
        assert_eq!(mesh.inferred_parametric_dim(), 2);
        let empty = ImportedMesh {
            spatial_dim: 3,
            ..ImportedMesh::default()
        };
        assert_eq!(empty.inferred_parametric_dim(), 3);
    }

    #[test]
    fn no_importer_rejects_everything() {
        let err = NoImporter
            .import_mesh(Path::new("x.nc"), FileFormat::Scrip, &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, MeshError::Configuration(_)));
    }
}
