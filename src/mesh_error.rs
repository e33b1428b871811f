//! MeshError: Unified error type for regrid-mesh public APIs
//!
//! Fatal conditions abort the operation that raised them and leave the
//! receiver unchanged. Non-fatal conditions are reported as [`Advisory`]
//! values instead, collected on the object they degrade.

use crate::topology::element_type::{ElementType, MeshLocation};
use std::fmt;
use thiserror::Error;

/// Unified error type for mesh and grid operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Missing, contradictory or out-of-range construction arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Build-phase ordering violated (elements before nodes, double add, ...).
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// An input array does not have the length implied by the others.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// An element's declared type disagrees with its connectivity or the mesh.
    #[error("Topology mismatch at element {element}: {detail}")]
    TopologyMismatch { element: i64, detail: String },
    /// The same id appears twice among nodes or elements.
    #[error("Duplicate {location} id {id}")]
    DuplicateId { location: MeshLocation, id: i64 },
    /// Connectivity names a node id that is not in the node table.
    #[error("Element {element} references unknown node {node}")]
    DanglingReference { element: i64, node: i64 },
    /// Index-range slicing requested while running on several partitions.
    #[error("Operation requires a single partition, running on {partitions}")]
    UnsupportedInParallel { partitions: usize },
    /// The mesh was destroyed before this access.
    #[error("Mesh accessed after destroy")]
    UseAfterFree,
    /// Dimension, location or index outside what the object holds.
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),
    /// Malformed mesh file content.
    #[error("Mesh I/O parse error: {0}")]
    MeshIoParse(String),
    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        MeshError::Io(err.to_string())
    }
}

/// Non-fatal condition that disables one sub-feature of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// A construction option was supplied outside its valid path and dropped.
    IgnoredOption {
        option: &'static str,
        reason: &'static str,
    },
    /// No element coordinates were supplied; element-location coordinate
    /// access is unavailable on this mesh.
    ElementCoordsUnavailable,
    /// Free-form notice raised by a file importer.
    ImportNotice(String),
}

impl Advisory {
    /// Log the advisory through the `log` facade.
    pub(crate) fn emit(&self) {
        log::warn!("{self}");
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::IgnoredOption { option, reason } => {
                write!(f, "{option} {reason}, this argument will be ignored")
            }
            Advisory::ElementCoordsUnavailable => {
                write!(f, "mesh element coordinates are not available")
            }
            Advisory::ImportNotice(msg) => write!(f, "import: {msg}"),
        }
    }
}

/// Returns [`MeshError::TopologyMismatch`] for an element type whose
/// connectivity run has the wrong length.
pub(crate) fn arity_mismatch(element: i64, ty: ElementType, found: usize) -> MeshError {
    MeshError::TopologyMismatch {
        element,
        detail: format!(
            "{ty:?} expects {} nodes, connectivity provides {found}",
            ty.arity()
        ),
    }
}
