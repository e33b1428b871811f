//! Unstructured mesh with node/element duality and a two-phase build.
//!
//! An in-memory mesh is created empty, receives its nodes with
//! [`Mesh::add_nodes`] and then its elements with [`Mesh::add_elements`]; the
//! second call commits the mesh and links the coordinate store. A from-file
//! mesh receives both tables from a [`MeshImporter`] in one step and is
//! committed immediately. Once committed the mesh is read-only apart from
//! in-place coordinate edits through [`Mesh::get_coords_mut`].
//!
//! [`Mesh::destroy`] releases all tables; every later access fails with
//! [`MeshError::UseAfterFree`]. Dropping a mesh destroys it.

pub mod options;
pub mod view;

use crate::algs::communicator::{Communicator, NoComm};
use crate::data::coordinates::{CoordView, CoordViewMut, CoordinateStore, LinkedLocation};
use crate::data::element_table::{ElementFields, ElementTable};
use crate::data::node_table::NodeTable;
use crate::io::{ImportedMesh, MeshImporter, unsupported_format};
use crate::mesh_error::{Advisory, MeshError};
use crate::topology::element_type::{ElementType, MeshLocation};
use options::{FileFormat, ImportOptions, MeshOptions, MeshSource};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
pub use view::MeshView;

/// Where a mesh is in its build protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildPhase {
    /// Created, no nodes yet.
    Empty,
    /// Nodes added, waiting for elements.
    NodesAdded,
    /// Elements added (or imported); sizes and coordinates are queryable.
    Committed,
    /// Destroyed.
    Finalized,
}

pub struct Mesh {
    parametric_dim: usize,
    spatial_dim: usize,
    comm: Arc<dyn Communicator>,
    nodes: Option<NodeTable>,
    elements: Option<ElementTable>,
    store: Option<CoordinateStore>,
    advisories: Vec<Advisory>,
    meta: BTreeMap<String, String>,
    finalized: bool,
}

impl Mesh {
    /// Create an empty serial mesh.
    pub fn new(parametric_dim: usize, spatial_dim: usize) -> Result<Self, MeshError> {
        Self::with_communicator(parametric_dim, spatial_dim, Arc::new(NoComm))
    }

    /// Create an empty mesh on the partition described by `comm`.
    pub fn with_communicator(
        parametric_dim: usize,
        spatial_dim: usize,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self, MeshError> {
        check_dims(parametric_dim, spatial_dim)?;
        Ok(Self {
            parametric_dim,
            spatial_dim,
            comm,
            nodes: None,
            elements: None,
            store: None,
            advisories: Vec::new(),
            meta: BTreeMap::new(),
            finalized: false,
        })
    }

    /// Run `f` on a fresh serial mesh and destroy it afterwards, whether or
    /// not `f` succeeds.
    pub fn scoped<T, F>(parametric_dim: usize, spatial_dim: usize, f: F) -> Result<T, MeshError>
    where
        F: FnOnce(&mut Mesh) -> Result<T, MeshError>,
    {
        let mut mesh = Self::new(parametric_dim, spatial_dim)?;
        let out = f(&mut mesh);
        mesh.destroy();
        out
    }

    /// Build a mesh from validated construction options.
    ///
    /// Advisories from the option pass are kept on the returned mesh.
    pub fn from_options(
        options: &MeshOptions,
        importer: &dyn MeshImporter,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self, MeshError> {
        let (source, advisories) = options.resolve()?;
        let mut mesh = match source {
            MeshSource::InMemory {
                parametric_dim,
                spatial_dim,
            } => Self::with_communicator(parametric_dim, spatial_dim, comm)?,
            MeshSource::File {
                path,
                format,
                options,
            } => Self::create_from_file(&path, format, &options, importer, comm)?,
        };
        let later = std::mem::replace(&mut mesh.advisories, advisories);
        mesh.advisories.extend(later);
        Ok(mesh)
    }

    /// Import, validate and commit a mesh stored in a file.
    pub fn create_from_file(
        path: &Path,
        format: FileFormat,
        options: &ImportOptions,
        importer: &dyn MeshImporter,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self, MeshError> {
        if !importer.supports(format) {
            return Err(unsupported_format(format));
        }
        log::debug!("importing {format:?} mesh from {}", path.display());
        let imported = importer.import_mesh(path, format, options)?;
        Self::from_imported(imported, comm)
    }

    /// Validate and commit raw imported arrays in one step.
    ///
    /// The parametric dimension is inferred from the element types.
    pub fn from_imported(imported: ImportedMesh, comm: Arc<dyn Communicator>) -> Result<Self, MeshError> {
        let parametric_dim = imported.inferred_parametric_dim();
        let mut mesh = Self::with_communicator(parametric_dim, imported.spatial_dim, comm)?;
        for adv in &imported.advisories {
            adv.emit();
        }
        mesh.advisories.extend(imported.advisories);

        let mut nodes = NodeTable::try_new(
            mesh.spatial_dim,
            imported.node_ids,
            imported.node_coords,
            imported.node_owners,
        )?;
        if let Some(mask) = imported.node_mask {
            nodes = nodes.with_mask(mask)?;
        }
        let elements = ElementTable::try_new(
            &nodes,
            mesh.parametric_dim,
            mesh.spatial_dim,
            imported.element_ids,
            imported.element_types,
            imported.connectivity,
            imported.element_fields,
        )?;
        mesh.nodes = Some(nodes);
        mesh.commit(elements);
        Ok(mesh)
    }

    /// Add the node table. Callable once, before [`Mesh::add_elements`].
    pub fn add_nodes(
        &mut self,
        ids: &[i64],
        coords: &[f64],
        owners: &[usize],
    ) -> Result<(), MeshError> {
        match self.phase() {
            BuildPhase::Empty => {}
            BuildPhase::NodesAdded => {
                return Err(MeshError::InvalidState("nodes were already added".into()));
            }
            BuildPhase::Committed => {
                return Err(MeshError::InvalidState(
                    "cannot add nodes after elements were added".into(),
                ));
            }
            BuildPhase::Finalized => return Err(MeshError::UseAfterFree),
        }
        let table = NodeTable::try_new(
            self.spatial_dim,
            ids.to_vec(),
            coords.to_vec(),
            owners.to_vec(),
        )?;
        log::debug!("added {} nodes", table.len());
        self.nodes = Some(table);
        Ok(())
    }

    /// Add the element table and commit the mesh.
    ///
    /// Nothing is committed if validation fails.
    pub fn add_elements(
        &mut self,
        ids: &[i64],
        types: &[ElementType],
        connectivity: &[i64],
        fields: ElementFields,
    ) -> Result<(), MeshError> {
        let nodes = match self.phase() {
            BuildPhase::Empty => {
                return Err(MeshError::InvalidState(
                    "nodes must be added before elements".into(),
                ));
            }
            BuildPhase::Committed => {
                return Err(MeshError::InvalidState("elements were already added".into()));
            }
            BuildPhase::Finalized => return Err(MeshError::UseAfterFree),
            BuildPhase::NodesAdded => self
                .nodes
                .as_ref()
                .ok_or_else(|| MeshError::InvalidState("node table missing".into()))?,
        };
        let table = ElementTable::try_new(
            nodes,
            self.parametric_dim,
            self.spatial_dim,
            ids.to_vec(),
            types.to_vec(),
            connectivity.to_vec(),
            fields,
        )?;
        self.commit(table);
        Ok(())
    }

    fn commit(&mut self, elements: ElementTable) {
        let rank = self.comm.rank();
        let (node, element) = match &self.nodes {
            Some(nodes) => (
                LinkedLocation {
                    count: nodes.len(),
                    owned: nodes.ownership().owned_count(rank),
                    has_coords: true,
                },
                LinkedLocation {
                    count: elements.len(),
                    owned: elements.len(),
                    has_coords: elements.has_coords(),
                },
            ),
            None => return,
        };
        let (store, advisories) = CoordinateStore::link(self.spatial_dim, node, element);
        for adv in &advisories {
            adv.emit();
        }
        self.advisories.extend(advisories);
        self.store = Some(store);
        self.elements = Some(elements);
        log::debug!(
            "committed mesh: {} nodes ({} owned), {} elements",
            node.count,
            node.owned,
            element.count
        );
    }

    /// Current build phase.
    pub fn phase(&self) -> BuildPhase {
        if self.finalized {
            BuildPhase::Finalized
        } else if self.elements.is_some() {
            BuildPhase::Committed
        } else if self.nodes.is_some() {
            BuildPhase::NodesAdded
        } else {
            BuildPhase::Empty
        }
    }

    #[inline]
    pub fn parametric_dim(&self) -> usize {
        self.parametric_dim
    }

    #[inline]
    pub fn spatial_dim(&self) -> usize {
        self.spatial_dim
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The partition this mesh belongs to.
    pub fn communicator(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    /// Advisories raised while constructing this mesh, oldest first.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Free-form metadata attached by the caller.
    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.meta
    }

    fn ensure_live(&self) -> Result<(), MeshError> {
        if self.finalized {
            return Err(MeshError::UseAfterFree);
        }
        Ok(())
    }

    fn linked(&self, loc: MeshLocation) -> Result<Option<&LinkedLocation>, MeshError> {
        self.ensure_live()?;
        Ok(self.store.as_ref().map(|s| s.location(loc)))
    }

    /// Local entity count at `loc`; zero before commit.
    pub fn size(&self, loc: MeshLocation) -> Result<usize, MeshError> {
        Ok(self.linked(loc)?.map_or(0, |l| l.count))
    }

    /// Entities at `loc` owned by this partition; zero before commit.
    pub fn size_owned(&self, loc: MeshLocation) -> Result<usize, MeshError> {
        Ok(self.linked(loc)?.map_or(0, |l| l.owned))
    }

    pub fn node_count(&self) -> Result<usize, MeshError> {
        self.size(MeshLocation::Node)
    }

    pub fn element_count(&self) -> Result<usize, MeshError> {
        self.size(MeshLocation::Element)
    }

    pub fn owned_node_count(&self) -> Result<usize, MeshError> {
        self.size_owned(MeshLocation::Node)
    }

    pub fn owned_element_count(&self) -> Result<usize, MeshError> {
        self.size_owned(MeshLocation::Element)
    }

    /// Node table, once nodes were added.
    pub fn nodes(&self) -> Result<&NodeTable, MeshError> {
        self.ensure_live()?;
        self.nodes
            .as_ref()
            .ok_or_else(|| MeshError::InvalidState("no nodes were added".into()))
    }

    /// Element table of a committed mesh.
    pub fn elements(&self) -> Result<&ElementTable, MeshError> {
        self.ensure_live()?;
        self.elements
            .as_ref()
            .ok_or_else(|| MeshError::InvalidState("no elements were added".into()))
    }

    fn store(&self) -> Result<&CoordinateStore, MeshError> {
        self.ensure_live()?;
        self.store
            .as_ref()
            .ok_or_else(|| MeshError::IndexOutOfRange("coordinates were not linked".into()))
    }

    /// Coordinate component `dim` at `loc`, aliased to the table storage.
    pub fn get_coords(&self, dim: usize, loc: MeshLocation) -> Result<CoordView<'_>, MeshError> {
        self.store()?.check_access(dim, loc)?;
        let view = match loc {
            MeshLocation::Node => self.nodes()?.coord_view(dim),
            MeshLocation::Element => self.elements()?.coord_view(dim).ok_or_else(|| {
                MeshError::IndexOutOfRange("element coordinates were not linked".into())
            })?,
        };
        Ok(view)
    }

    /// Writable coordinate component `dim` at `loc`.
    pub fn get_coords_mut(
        &mut self,
        dim: usize,
        loc: MeshLocation,
    ) -> Result<CoordViewMut<'_>, MeshError> {
        self.store()?.check_access(dim, loc)?;
        let missing = || MeshError::IndexOutOfRange(format!("{loc} coordinates were not linked"));
        match loc {
            MeshLocation::Node => self
                .nodes
                .as_mut()
                .map(|n| n.coord_view_mut(dim))
                .ok_or_else(missing),
            MeshLocation::Element => self
                .elements
                .as_mut()
                .and_then(|e| e.coord_view_mut(dim))
                .ok_or_else(missing),
        }
    }

    /// Mask values at `loc`, if any were supplied.
    pub fn mask(&self, loc: MeshLocation) -> Result<Option<&[i32]>, MeshError> {
        match loc {
            MeshLocation::Node => Ok(self.nodes()?.mask()),
            MeshLocation::Element => Ok(self.elements()?.mask()),
        }
    }

    /// Element areas, if any were supplied.
    pub fn area(&self) -> Result<Option<&[f64]>, MeshError> {
        Ok(self.elements()?.area())
    }

    /// Full read-only view of a committed mesh.
    pub fn view(&self) -> Result<MeshView<'_>, MeshError> {
        self.ensure_live()?;
        if self.phase() != BuildPhase::Committed {
            return Err(MeshError::InvalidState(
                "views require a committed mesh".into(),
            ));
        }
        MeshView::full(self)
    }

    /// Index-range slice of the node coordinates; see [`MeshView::slice`].
    pub fn slice(&self, range: Range<usize>) -> Result<MeshView<'_>, MeshError> {
        view::ensure_serial(self.communicator())?;
        self.view()?.slice(range)
    }

    /// View fixed to one location; see [`MeshView::preslice`].
    pub fn preslice(&self, loc: MeshLocation) -> Result<MeshView<'_>, MeshError> {
        self.view()?.preslice(loc)
    }

    /// Release build-time scratch data; the mesh stays queryable.
    pub fn free_memory(&mut self) -> Result<(), MeshError> {
        self.ensure_live()?;
        if let Some(elements) = self.elements.as_mut() {
            elements.release_resolved();
        }
        Ok(())
    }

    /// Release all tables. Idempotent and infallible.
    pub fn destroy(&mut self) {
        if self.finalized {
            return;
        }
        log::debug!(
            "destroying mesh ({} nodes, {} elements)",
            self.nodes.as_ref().map_or(0, |n| n.len()),
            self.elements.as_ref().map_or(0, |e| e.len())
        );
        self.store = None;
        self.elements = None;
        self.nodes = None;
        self.finalized = true;
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes = self.store.as_ref().map(|s| {
            MeshLocation::ALL.map(|loc| (s.location(loc).count, s.location(loc).owned))
        });
        f.debug_struct("Mesh")
            .field("parametric_dim", &self.parametric_dim)
            .field("spatial_dim", &self.spatial_dim)
            .field("phase", &self.phase())
            .field("sizes", &sizes)
            .field("rank", &self.comm.rank())
            .finish()
    }
}

fn check_dims(parametric_dim: usize, spatial_dim: usize) -> Result<(), MeshError> {
    if parametric_dim == 0 || spatial_dim < parametric_dim {
        return Err(MeshError::Configuration(format!(
            "need spatial_dim >= parametric_dim >= 1, got parametric_dim {parametric_dim}, \
             spatial_dim {spatial_dim}"
        )));
    }
    Ok(())
}
