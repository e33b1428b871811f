//! Node/element table validation helpers.
//!
//! These run before anything is committed to a mesh, so a failure leaves the
//! caller's mesh untouched.

use crate::mesh_error::{MeshError, arity_mismatch};
use crate::topology::element_type::{ElementType, MeshLocation};
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

/// Check that `actual` has the length implied by the other inputs.
pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), MeshError> {
    if expected != actual {
        return Err(MeshError::DimensionMismatch {
            what,
            expected,
            found: actual,
        });
    }
    Ok(())
}

/// Build an id -> local index map, rejecting repeated ids.
pub fn index_unique_ids(
    location: MeshLocation,
    ids: &[i64],
) -> Result<HashMap<i64, usize>, MeshError> {
    let mut index = HashMap::with_capacity(ids.len());
    for (idx, &id) in ids.iter().enumerate() {
        match index.entry(id) {
            Entry::Occupied(_) => return Err(MeshError::DuplicateId { location, id }),
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
        }
    }
    Ok(index)
}

/// Connectivity resolved to local node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedConnectivity {
    /// `offsets[i]..offsets[i + 1]` is the run of element `i`.
    pub offsets: Vec<usize>,
    /// Local node index for each connectivity entry.
    pub node_indices: Vec<usize>,
}

impl ResolvedConnectivity {
    /// Local node indices of element `idx`.
    pub fn element_nodes(&self, idx: usize) -> Option<&[usize]> {
        let start = *self.offsets.get(idx)?;
        let end = *self.offsets.get(idx + 1)?;
        self.node_indices.get(start..end)
    }
}

/// Walk the flat connectivity array element by element.
///
/// Every element must have the mesh's parametric dimension and a run whose
/// length equals its type's arity; every referenced node must be present in
/// `node_index`. Arity and dimension are checked for all elements before any
/// node lookup, so a malformed run is reported as a topology error rather than
/// as a dangling reference into the next element.
pub fn resolve_connectivity(
    parametric_dim: usize,
    element_ids: &[i64],
    types: &[ElementType],
    connectivity: &[i64],
    node_index: &HashMap<i64, usize>,
) -> Result<ResolvedConnectivity, MeshError> {
    let mut offsets = Vec::with_capacity(types.len() + 1);
    offsets.push(0usize);
    let mut cursor = 0usize;
    for (&id, &ty) in element_ids.iter().zip(types) {
        if ty.dimension() != parametric_dim {
            return Err(MeshError::TopologyMismatch {
                element: id,
                detail: format!(
                    "{ty:?} has dimension {} but the mesh parametric dimension is {parametric_dim}",
                    ty.dimension()
                ),
            });
        }
        if let ElementType::Polygon(n) = ty {
            if (n as usize) < ElementType::MIN_POLYGON_NODES {
                return Err(MeshError::TopologyMismatch {
                    element: id,
                    detail: format!(
                        "polygons need at least {} nodes, got {n}",
                        ElementType::MIN_POLYGON_NODES
                    ),
                });
            }
        }
        let available = connectivity.len().saturating_sub(cursor);
        if available < ty.arity() {
            return Err(arity_mismatch(id, ty, available));
        }
        cursor += ty.arity();
        offsets.push(cursor);
    }
    if cursor != connectivity.len() {
        let element = element_ids.last().copied().unwrap_or_default();
        return Err(MeshError::TopologyMismatch {
            element,
            detail: format!(
                "connectivity has {} entries beyond the last element",
                connectivity.len() - cursor
            ),
        });
    }

    let mut node_indices = Vec::with_capacity(connectivity.len());
    for (elem, &id) in element_ids.iter().enumerate() {
        for &node in &connectivity[offsets[elem]..offsets[elem + 1]] {
            let idx = node_index
                .get(&node)
                .copied()
                .ok_or(MeshError::DanglingReference { element: id, node })?;
            node_indices.push(idx);
        }
    }

    Ok(ResolvedConnectivity {
        offsets,
        node_indices,
    })
}
