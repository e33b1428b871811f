#![cfg_attr(docsrs, feature(doc_cfg))]
//! # regrid-mesh
//!
//! regrid-mesh is the mesh and grid data model consumed by regridding codes.
//! It provides an unstructured mesh with node/element duality, aliased
//! coordinate views, restricted views for slicing, and a companion
//! structured grid with stagger locations and periodic dimensions.
//!
//! ## Features
//! - Two-phase in-memory mesh build (nodes, then elements) with all-or-nothing
//!   validation of ids, element topology and connectivity
//! - Strided coordinate views that alias the mesh tables instead of copying
//! - Index-range and location slicing through borrowed [`MeshView`]s
//! - Import of mesh files through the [`MeshImporter`] adapter (Gmsh built in)
//! - Structured [`Grid`]s with block decomposition, halos and periodic wrap
//! - Pluggable partition information through [`Communicator`]
//!   (serial, simulated, or MPI with the `mpi-support` feature)
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! regrid-mesh = "0.1"
//! # features = ["mpi-support"]
//! ```
//!
//! [`MeshView`]: crate::mesh::MeshView
//! [`MeshImporter`]: crate::io::MeshImporter
//! [`Grid`]: crate::grid::Grid
//! [`Communicator`]: crate::algs::communicator::Communicator

pub mod algs;
pub mod data;
pub mod grid;
pub mod io;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::data::coordinates::{CoordView, CoordViewMut};
    pub use crate::data::element_table::ElementFields;
    pub use crate::grid::{CoordSys, Grid, GridItem, GridSpec, StaggerLoc};
    pub use crate::io::gmsh::GmshReader;
    pub use crate::io::{ImportedMesh, MeshImporter};
    pub use crate::mesh::options::{FileFormat, ImportOptions, MaskLocation, MeshOptions};
    pub use crate::mesh::{BuildPhase, Mesh, MeshView};
    pub use crate::mesh_error::{Advisory, MeshError};
    pub use crate::topology::element_type::{ElementType, MeshLocation};
}
