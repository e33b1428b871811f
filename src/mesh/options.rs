//! Mesh construction options and their validation pass.
//!
//! A mesh is built either in memory (`parametric_dim` + `spatial_dim`) or from
//! a file (`filename` + `file_format`). Options that do not apply to the chosen
//! path or format are dropped with an [`Advisory`] instead of failing the
//! construction.

use crate::mesh_error::{Advisory, MeshError};
use std::path::PathBuf;

/// Mesh file formats understood by the import layer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FileFormat {
    Scrip,
    EsmfMesh,
    Ugrid,
    /// ASCII Gmsh v2.2, read by [`crate::io::gmsh::GmshReader`].
    Gmsh,
}

/// Location a file-supplied mask is attached to.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize,
)]
pub enum MaskLocation {
    #[default]
    None,
    Node,
    Element,
}

/// Per-format options forwarded to a [`crate::io::MeshImporter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImportOptions {
    /// Build the dual mesh (SCRIP only).
    pub convert_to_dual: bool,
    /// Read user-supplied element areas (SCRIP and ESMFMESH).
    pub add_user_area: bool,
    /// Name of the mesh topology variable (UGRID only).
    pub mesh_variable_name: String,
    /// Where to attach the mask (UGRID only).
    pub mask_location: MaskLocation,
    /// Name of the mask variable (UGRID only).
    pub mask_variable_name: String,
}

impl ImportOptions {
    /// Names of the options that differ from their defaults.
    pub fn non_default(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.convert_to_dual {
            set.push("convert_to_dual");
        }
        if self.add_user_area {
            set.push("add_user_area");
        }
        if !self.mesh_variable_name.is_empty() {
            set.push("mesh_variable_name");
        }
        if self.mask_location != MaskLocation::None {
            set.push("mask_location");
        }
        if !self.mask_variable_name.is_empty() {
            set.push("mask_variable_name");
        }
        set
    }
}

/// Raw construction arguments, as a caller or config file supplies them.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    pub parametric_dim: Option<usize>,
    pub spatial_dim: Option<usize>,
    pub filename: Option<PathBuf>,
    pub file_format: Option<FileFormat>,
    pub convert_to_dual: Option<bool>,
    pub add_user_area: Option<bool>,
    pub mesh_variable_name: Option<String>,
    pub mask_location: Option<MaskLocation>,
    pub mask_variable_name: Option<String>,
}

/// Construction path selected by [`MeshOptions::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeshSource {
    InMemory {
        parametric_dim: usize,
        spatial_dim: usize,
    },
    File {
        path: PathBuf,
        format: FileFormat,
        options: ImportOptions,
    },
}

const FILE_ONLY: &str = "is only used for meshes created from file";

impl MeshOptions {
    /// In-memory options.
    pub fn in_memory(parametric_dim: usize, spatial_dim: usize) -> Self {
        Self {
            parametric_dim: Some(parametric_dim),
            spatial_dim: Some(spatial_dim),
            ..Self::default()
        }
    }

    /// From-file options with every format-specific option unset.
    pub fn from_file(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            filename: Some(path.into()),
            file_format: Some(format),
            ..Self::default()
        }
    }

    /// Pick the construction path and drop inapplicable options.
    ///
    /// Fails only when neither path is fully specified.
    pub fn resolve(&self) -> Result<(MeshSource, Vec<Advisory>), MeshError> {
        let mut advisories = Vec::new();
        let mut ignore = |present: bool, option: &'static str, reason: &'static str| {
            if present {
                let adv = Advisory::IgnoredOption { option, reason };
                adv.emit();
                advisories.push(adv);
            }
        };

        if self.parametric_dim.is_some() || self.spatial_dim.is_some() {
            let (Some(parametric_dim), Some(spatial_dim)) = (self.parametric_dim, self.spatial_dim)
            else {
                return Err(MeshError::Configuration(
                    "both parametric_dim and spatial_dim must be specified".into(),
                ));
            };
            ignore(self.filename.is_some(), "filename", FILE_ONLY);
            ignore(self.file_format.is_some(), "file_format", FILE_ONLY);
            ignore(self.convert_to_dual.is_some(), "convert_to_dual", FILE_ONLY);
            ignore(self.add_user_area.is_some(), "add_user_area", FILE_ONLY);
            ignore(
                self.mesh_variable_name.is_some(),
                "mesh_variable_name",
                FILE_ONLY,
            );
            ignore(self.mask_location.is_some(), "mask_location", FILE_ONLY);
            ignore(
                self.mask_variable_name.is_some(),
                "mask_variable_name",
                FILE_ONLY,
            );
            return Ok((
                MeshSource::InMemory {
                    parametric_dim,
                    spatial_dim,
                },
                advisories,
            ));
        }

        let (Some(path), Some(format)) = (self.filename.clone(), self.file_format) else {
            return Err(MeshError::Configuration(
                "must supply either parametric_dim and spatial_dim for an in-memory mesh \
                 or filename and file_format for a from-file mesh"
                    .into(),
            ));
        };

        let mut options = ImportOptions::default();
        if let Some(dual) = self.convert_to_dual {
            if format == FileFormat::Scrip {
                options.convert_to_dual = dual;
            } else {
                ignore(true, "convert_to_dual", "is only supported for SCRIP files");
            }
        }
        if let Some(area) = self.add_user_area {
            if matches!(format, FileFormat::Scrip | FileFormat::EsmfMesh) {
                options.add_user_area = area;
            } else {
                ignore(
                    true,
                    "add_user_area",
                    "is only supported for SCRIP and ESMFMESH files",
                );
            }
        }
        let ugrid = format == FileFormat::Ugrid;
        if let Some(name) = &self.mesh_variable_name {
            if ugrid {
                options.mesh_variable_name = name.clone();
            } else {
                ignore(true, "mesh_variable_name", "is only supported for UGRID files");
            }
        }
        if let Some(loc) = self.mask_location {
            if ugrid {
                options.mask_location = loc;
            } else {
                ignore(true, "mask_location", "is only supported for UGRID files");
            }
        }
        if let Some(name) = &self.mask_variable_name {
            if !ugrid {
                ignore(true, "mask_variable_name", "is only supported for UGRID files");
            } else if options.mask_location == MaskLocation::None {
                ignore(
                    true,
                    "mask_variable_name",
                    "is only used together with a mask_location",
                );
            } else {
                options.mask_variable_name = name.clone();
            }
        }

        Ok((
            MeshSource::File {
                path,
                format,
                options,
            },
            advisories,
        ))
    }
}

impl MeshSource {
    pub fn is_from_file(&self) -> bool {
        matches!(self, MeshSource::File { .. })
    }
}
