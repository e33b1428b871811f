//! Node table: ids, interleaved coordinates and owner tags.

use crate::data::coordinates::{CoordView, CoordViewMut};
use crate::mesh_error::MeshError;
use crate::topology::element_type::MeshLocation;
use crate::topology::ownership::NodeOwnership;
use crate::topology::validation::{check_len, index_unique_ids};
use hashbrown::HashMap;

/// Validated node data of one partition.
#[derive(Clone, Debug)]
pub struct NodeTable {
    spatial_dim: usize,
    ids: Vec<i64>,
    coords: Vec<f64>,
    ownership: NodeOwnership,
    mask: Option<Vec<i32>>,
    index: HashMap<i64, usize>,
}

impl NodeTable {
    /// Validate and take ownership of raw node arrays.
    pub fn try_new(
        spatial_dim: usize,
        ids: Vec<i64>,
        coords: Vec<f64>,
        owners: Vec<usize>,
    ) -> Result<Self, MeshError> {
        check_len("node coordinates", spatial_dim * ids.len(), coords.len())?;
        check_len("node owners", ids.len(), owners.len())?;
        let index = index_unique_ids(MeshLocation::Node, &ids)?;
        Ok(Self {
            spatial_dim,
            ids,
            coords,
            ownership: NodeOwnership::from_owners(owners),
            mask: None,
            index,
        })
    }

    /// Attach a per-node mask.
    pub fn with_mask(mut self, mask: Vec<i32>) -> Result<Self, MeshError> {
        check_len("node mask", self.ids.len(), mask.len())?;
        self.mask = Some(mask);
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Interleaved coordinates, `spatial_dim` values per node.
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Coordinate tuple of local node `idx`.
    pub fn point(&self, idx: usize) -> Option<&[f64]> {
        let start = idx.checked_mul(self.spatial_dim)?;
        self.coords.get(start..start.checked_add(self.spatial_dim)?)
    }

    pub fn ownership(&self) -> &NodeOwnership {
        &self.ownership
    }

    pub fn mask(&self) -> Option<&[i32]> {
        self.mask.as_deref()
    }

    /// Local index of node `id`.
    pub fn local_index(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub(crate) fn id_index(&self) -> &HashMap<i64, usize> {
        &self.index
    }

    /// Component `dim` of the node coordinates, aliased.
    pub fn coord_view(&self, dim: usize) -> CoordView<'_> {
        CoordView::interleaved(&self.coords, self.spatial_dim, dim)
    }

    /// Mutable component `dim` of the node coordinates.
    pub fn coord_view_mut(&mut self, dim: usize) -> CoordViewMut<'_> {
        CoordViewMut::interleaved(&mut self.coords, self.spatial_dim, dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_are_checked_against_spatial_dim() {
        let err = NodeTable::try_new(2, vec![0, 1], vec![0.0; 3], vec![0, 0]).unwrap_err();
        assert_eq!(
            err,
            MeshError::DimensionMismatch {
                what: "node coordinates",
                expected: 4,
                found: 3
            }
        );
        let err = NodeTable::try_new(2, vec![0, 1], vec![0.0; 4], vec![0]).unwrap_err();
        assert!(matches!(err, MeshError::DimensionMismatch { what: "node owners", .. }));
    }

    #[test]
    fn ids_map_to_local_indices() {
        let table =
            NodeTable::try_new(3, vec![7, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0, 1])
                .unwrap();
        assert_eq!(table.local_index(3), Some(1));
        assert_eq!(table.point(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(table.coord_view(2), [3.0, 6.0]);
        assert_eq!(table.ownership().owned_count(1), 1);
    }

    #[test]
    fn out_of_range_points_are_none() {
        let table = NodeTable::try_new(2, vec![1], vec![0.5, 1.5], vec![0]).unwrap();
        assert_eq!(table.point(1), None);
        assert_eq!(table.point(usize::MAX / 2), None);
        assert_eq!(table.point(usize::MAX), None);
    }

    #[test]
    fn mask_length_must_match() {
        let table = NodeTable::try_new(1, vec![1, 2], vec![0.0, 1.0], vec![0, 0]).unwrap();
        assert!(table.clone().with_mask(vec![1]).is_err());
        assert_eq!(table.with_mask(vec![1, 0]).unwrap().mask(), Some(&[1, 0][..]));
    }
}
