//! Element table: ids, topology tags, connectivity and optional per-element data.

use crate::data::coordinates::{CoordView, CoordViewMut};
use crate::data::node_table::NodeTable;
use crate::mesh_error::MeshError;
use crate::topology::element_type::{ElementType, MeshLocation};
use crate::topology::validation::{
    ResolvedConnectivity, check_len, index_unique_ids, resolve_connectivity,
};

/// Optional per-element arrays; each is either present for every element or absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementFields {
    pub mask: Option<Vec<i32>>,
    pub area: Option<Vec<f64>>,
    /// Interleaved, `spatial_dim` values per element.
    pub coords: Option<Vec<f64>>,
}

impl ElementFields {
    pub fn with_mask(mut self, mask: Vec<i32>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_area(mut self, area: Vec<f64>) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_coords(mut self, coords: Vec<f64>) -> Self {
        self.coords = Some(coords);
        self
    }
}

/// Validated element data of one partition.
#[derive(Clone, Debug)]
pub struct ElementTable {
    spatial_dim: usize,
    ids: Vec<i64>,
    types: Vec<ElementType>,
    connectivity: Vec<i64>,
    fields: ElementFields,
    resolved: Option<ResolvedConnectivity>,
}

impl ElementTable {
    /// Validate raw element arrays against a committed node table.
    ///
    /// Checks run in order: array lengths, id uniqueness, per-element
    /// topology, node references.
    pub fn try_new(
        nodes: &NodeTable,
        parametric_dim: usize,
        spatial_dim: usize,
        ids: Vec<i64>,
        types: Vec<ElementType>,
        connectivity: Vec<i64>,
        fields: ElementFields,
    ) -> Result<Self, MeshError> {
        let n = ids.len();
        check_len("element types", n, types.len())?;
        if let Some(mask) = &fields.mask {
            check_len("element mask", n, mask.len())?;
        }
        if let Some(area) = &fields.area {
            check_len("element area", n, area.len())?;
        }
        if let Some(coords) = &fields.coords {
            check_len("element coordinates", spatial_dim * n, coords.len())?;
        }
        index_unique_ids(MeshLocation::Element, &ids)?;
        let resolved =
            resolve_connectivity(parametric_dim, &ids, &types, &connectivity, nodes.id_index())?;
        Ok(Self {
            spatial_dim,
            ids,
            types,
            connectivity,
            fields,
            resolved: Some(resolved),
        })
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

    pub fn types(&self) -> &[ElementType] {
        &self.types
    }

    /// Flat node-id connectivity as supplied.
    pub fn connectivity(&self) -> &[i64] {
        &self.connectivity
    }

    /// Node ids of element `idx`.
    pub fn element_connectivity(&self, idx: usize) -> Option<&[i64]> {
        let start: usize = self.types.get(..idx)?.iter().map(|t| t.arity()).sum();
        let ty = self.types.get(idx)?;
        self.connectivity.get(start..start + ty.arity())
    }

    /// Connectivity resolved to local node indices, unless released.
    pub fn resolved(&self) -> Option<&ResolvedConnectivity> {
        self.resolved.as_ref()
    }

    /// Drop the resolved index maps; connectivity by id stays available.
    pub fn release_resolved(&mut self) {
        self.resolved = None;
    }

    pub fn mask(&self) -> Option<&[i32]> {
        self.fields.mask.as_deref()
    }

    pub fn area(&self) -> Option<&[f64]> {
        self.fields.area.as_deref()
    }

    pub fn has_coords(&self) -> bool {
        self.fields.coords.is_some()
    }

    /// Component `dim` of the element coordinates, when supplied.
    pub fn coord_view(&self, dim: usize) -> Option<CoordView<'_>> {
        self.fields
            .coords
            .as_deref()
            .map(|c| CoordView::interleaved(c, self.spatial_dim, dim))
    }

    pub fn coord_view_mut(&mut self, dim: usize) -> Option<CoordViewMut<'_>> {
        let stride = self.spatial_dim;
        self.fields
            .coords
            .as_deref_mut()
            .map(|c| CoordViewMut::interleaved(c, stride, dim))
    }
}
