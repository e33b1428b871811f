//! Restricted, read-only views of a committed mesh.
//!
//! A [`MeshView`] borrows its mesh, so it can neither outlive it nor release
//! it. Views come in two shapes: two-location views indexed
//! `[location][dimension]`, and single-location views (after
//! [`MeshView::preslice`]) indexed by dimension only.
//!
//! Index-range slicing narrows node coordinates only. Element coordinates of a
//! sliced two-location view are left unset and its element size is unknown;
//! there is no defined rule for slicing element coordinates by a node range.

use super::Mesh;
use crate::algs::communicator::Communicator;
use crate::data::coordinates::{CoordView, check_range};
use crate::mesh_error::MeshError;
use crate::topology::element_type::MeshLocation;
use std::ops::Range;

/// Coordinates and sizes of one location inside a view.
#[derive(Clone, Debug)]
struct LocationView<'a> {
    coords: Option<Vec<CoordView<'a>>>,
    size: Option<usize>,
    size_owned: Option<usize>,
}

impl<'a> LocationView<'a> {
    fn sliced(&self, range: Range<usize>) -> Result<Self, MeshError> {
        let size = self.size.ok_or_else(|| {
            MeshError::IndexOutOfRange("cannot slice a location of unknown size".into())
        })?;
        check_range(&range, size)?;
        let coords = self
            .coords
            .as_ref()
            .map(|dims| {
                dims.iter()
                    .map(|v| v.slice(range.clone()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let len = range.end - range.start;
        Ok(Self {
            coords,
            size: Some(len),
            size_owned: Some(len),
        })
    }

    fn unset() -> Self {
        Self {
            coords: None,
            size: None,
            size_owned: None,
        }
    }
}

#[derive(Clone, Debug)]
enum Shape<'a> {
    /// Indexed `[location][dimension]`.
    Both([LocationView<'a>; 2]),
    /// Fixed to one location; indexed `[dimension]`.
    Single {
        location: MeshLocation,
        view: LocationView<'a>,
    },
}

/// Read-only view over a committed mesh.
#[derive(Clone, Debug)]
pub struct MeshView<'a> {
    mesh: &'a Mesh,
    shape: Shape<'a>,
}

/// Fail unless the communicator reports exactly one partition.
pub(crate) fn ensure_serial(comm: &dyn Communicator) -> Result<(), MeshError> {
    let partitions = comm.size();
    if partitions > 1 {
        return Err(MeshError::UnsupportedInParallel { partitions });
    }
    Ok(())
}

impl<'a> MeshView<'a> {
    pub(super) fn full(mesh: &'a Mesh) -> Result<Self, MeshError> {
        let mut locations = MeshLocation::ALL.map(|_| LocationView::unset());
        for loc in MeshLocation::ALL {
            let coords = match mesh.get_coords(0, loc) {
                Ok(_) => Some(
                    (0..mesh.spatial_dim())
                        .map(|dim| mesh.get_coords(dim, loc))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                Err(MeshError::IndexOutOfRange(_)) => None,
                Err(err) => return Err(err),
            };
            locations[loc.index()] = LocationView {
                coords,
                size: Some(mesh.size(loc)?),
                size_owned: Some(mesh.size_owned(loc)?),
            };
        }
        Ok(Self {
            mesh,
            shape: Shape::Both(locations),
        })
    }

    /// The mesh this view borrows from.
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    /// The fixed location of a presliced view.
    pub fn single_location(&self) -> Option<MeshLocation> {
        match &self.shape {
            Shape::Both(_) => None,
            Shape::Single { location, .. } => Some(*location),
        }
    }

    fn location(&self, loc: MeshLocation) -> Option<&LocationView<'a>> {
        match &self.shape {
            Shape::Both(views) => Some(&views[loc.index()]),
            Shape::Single { location, view } => (*location == loc).then_some(view),
        }
    }

    /// Entity count at `loc`; `None` if unknown or not part of the view.
    pub fn size(&self, loc: MeshLocation) -> Option<usize> {
        self.location(loc).and_then(|v| v.size)
    }

    pub fn size_owned(&self, loc: MeshLocation) -> Option<usize> {
        self.location(loc).and_then(|v| v.size_owned)
    }

    /// Coordinate component `dim` at `loc`.
    ///
    /// On a single-location view `loc` must equal the fixed location.
    pub fn get_coords(&self, dim: usize, loc: MeshLocation) -> Result<CoordView<'a>, MeshError> {
        let view = self.location(loc).ok_or_else(|| {
            MeshError::IndexOutOfRange(format!("{loc} is not part of this view"))
        })?;
        let coords = view
            .coords
            .as_ref()
            .ok_or_else(|| MeshError::IndexOutOfRange(format!("{loc} coordinates are not set")))?;
        coords.get(dim).copied().ok_or_else(|| {
            MeshError::IndexOutOfRange(format!(
                "coordinate dimension {dim} >= spatial dimension {}",
                coords.len()
            ))
        })
    }

    /// Index-range slice.
    ///
    /// On a two-location view the node coordinates of every dimension are
    /// narrowed to `range` and the element location is left unset. On a
    /// single-location view this is [`MeshView::slice_single_location`].
    pub fn slice(&self, range: Range<usize>) -> Result<MeshView<'a>, MeshError> {
        ensure_serial(self.mesh.communicator())?;
        match &self.shape {
            Shape::Both([node, _]) => {
                let node = node.sliced(range)?;
                Ok(Self {
                    mesh: self.mesh,
                    shape: Shape::Both([node, LocationView::unset()]),
                })
            }
            Shape::Single { .. } => self.slice_single_location(range),
        }
    }

    /// Fix the view to `loc`, dropping the location axis.
    pub fn preslice(&self, loc: MeshLocation) -> Result<MeshView<'a>, MeshError> {
        match &self.shape {
            Shape::Both(views) => Ok(Self {
                mesh: self.mesh,
                shape: Shape::Single {
                    location: loc,
                    view: views[loc.index()].clone(),
                },
            }),
            Shape::Single { location, .. } => Err(MeshError::InvalidState(format!(
                "view is already fixed to {location}"
            ))),
        }
    }

    /// Index-range slice of a view fixed to one location.
    pub fn slice_single_location(&self, range: Range<usize>) -> Result<MeshView<'a>, MeshError> {
        ensure_serial(self.mesh.communicator())?;
        match &self.shape {
            Shape::Single { location, view } => Ok(Self {
                mesh: self.mesh,
                shape: Shape::Single {
                    location: *location,
                    view: view.sliced(range)?,
                },
            }),
            Shape::Both(_) => Err(MeshError::InvalidState(
                "single-location slicing requires a presliced view".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;
    use crate::data::element_table::ElementFields;
    use crate::topology::element_type::ElementType;
    use std::sync::Arc;

    fn strip(comm: Arc<dyn Communicator>, with_elem_coords: bool) -> Mesh {
        // 2x1 quads: nodes 0..6 along two rows
        let mut mesh = Mesh::with_communicator(2, 2, comm).unwrap();
        mesh.add_nodes(
            &[0, 1, 2, 3, 4, 5],
            &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0],
            &[0; 6],
        )
        .unwrap();
        let fields = if with_elem_coords {
            ElementFields::default().with_coords(vec![0.5, 0.5, 1.5, 0.5])
        } else {
            ElementFields::default()
        };
        mesh.add_elements(
            &[0, 1],
            &[ElementType::Quadrilateral; 2],
            &[0, 1, 4, 3, 1, 2, 5, 4],
            fields,
        )
        .unwrap();
        mesh
    }

    #[test]
    fn full_view_aliases_mesh_coords() {
        let mesh = strip(Arc::new(LocalComm::new(0, 1).unwrap()), true);
        let view = mesh.view().unwrap();
        let a = view.get_coords(1, MeshLocation::Node).unwrap();
        let b = mesh.get_coords(1, MeshLocation::Node).unwrap();
        assert!(a.aliases(&b));
        assert_eq!(view.size(MeshLocation::Element), Some(2));
        assert_eq!(view.get_coords(0, MeshLocation::Element).unwrap(), [0.5, 1.5]);
    }

    #[test]
    fn slice_narrows_nodes_and_unsets_elements() {
        let mesh = strip(Arc::new(LocalComm::new(0, 1).unwrap()), true);
        let view = mesh.slice(1..4).unwrap();
        assert_eq!(view.get_coords(0, MeshLocation::Node).unwrap(), [1.0, 2.0, 0.0]);
        assert_eq!(view.get_coords(1, MeshLocation::Node).unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(view.size(MeshLocation::Node), Some(3));
        assert_eq!(view.size_owned(MeshLocation::Node), Some(3));
        assert_eq!(view.size(MeshLocation::Element), None);
        assert!(view.get_coords(0, MeshLocation::Element).is_err());

        let nested = view.slice(1..2).unwrap();
        assert_eq!(nested.get_coords(0, MeshLocation::Node).unwrap(), [2.0]);
        assert!(view.slice(0..4).is_err());
    }

    #[test]
    fn preslice_drops_the_other_location() {
        let mesh = strip(Arc::new(LocalComm::new(0, 1).unwrap()), true);
        let elems = mesh.preslice(MeshLocation::Element).unwrap();
        assert_eq!(elems.single_location(), Some(MeshLocation::Element));
        assert_eq!(elems.size(MeshLocation::Element), Some(2));
        assert_eq!(elems.size(MeshLocation::Node), None);
        assert!(elems.get_coords(0, MeshLocation::Node).is_err());
        assert!(elems.preslice(MeshLocation::Node).is_err());

        let one = elems.slice_single_location(1..2).unwrap();
        assert_eq!(one.get_coords(0, MeshLocation::Element).unwrap(), [1.5]);
        assert_eq!(one.size(MeshLocation::Element), Some(1));
    }

    #[test]
    fn single_location_slice_requires_preslice() {
        let mesh = strip(Arc::new(LocalComm::new(0, 1).unwrap()), false);
        let err = mesh.view().unwrap().slice_single_location(0..1).unwrap_err();
        assert!(matches!(err, MeshError::InvalidState(_)));
        let elems = mesh.preslice(MeshLocation::Element).unwrap();
        let sliced = elems.slice(0..1).unwrap();
        assert_eq!(sliced.size(MeshLocation::Element), Some(1));
        assert!(sliced.get_coords(0, MeshLocation::Element).is_err());
    }

    #[test]
    fn slicing_is_rejected_in_parallel() {
        let mesh = strip(Arc::new(LocalComm::new(0, 2).unwrap()), false);
        assert_eq!(
            mesh.slice(0..2).unwrap_err(),
            MeshError::UnsupportedInParallel { partitions: 2 }
        );
        let nodes = mesh.preslice(MeshLocation::Node).unwrap();
        assert!(matches!(
            nodes.slice_single_location(0..2),
            Err(MeshError::UnsupportedInParallel { .. })
        ));
    }
}
