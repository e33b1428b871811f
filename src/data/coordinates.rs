//! Coordinate storage views for mesh locations.
//!
//! Node and element tables keep their coordinates interleaved
//! (`x0 y0 x1 y1 ...`). A [`CoordView`] is a strided, non-owning window onto
//! one component of that buffer, so reading coordinates never copies and a
//! write through [`CoordViewMut`] is visible to every later view.

use crate::mesh_error::{Advisory, MeshError};
use crate::topology::element_type::MeshLocation;
use std::ops::Range;

/// Read-only strided view over one coordinate component.
#[derive(Clone, Copy, Debug)]
pub struct CoordView<'a> {
    data: &'a [f64],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> CoordView<'a> {
    /// View component `dim` of an interleaved buffer with `stride` components.
    pub fn interleaved(data: &'a [f64], stride: usize, dim: usize) -> Self {
        let len = if stride == 0 { 0 } else { data.len() / stride };
        Self {
            data,
            offset: dim,
            stride,
            len,
        }
    }

    /// Number of entries in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry `i` of the view.
    #[inline]
    pub fn get(&self, i: usize) -> Option<f64> {
        if i >= self.len {
            return None;
        }
        self.data.get(self.offset + i * self.stride).copied()
    }

    /// Iterate over the viewed entries.
    pub fn iter(&self) -> impl Iterator<Item = f64> + use<'a> {
        self.data
            .get(self.offset..)
            .unwrap_or(&[])
            .iter()
            .step_by(self.stride.max(1))
            .take(self.len)
            .copied()
    }

    /// Copy the viewed entries out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Narrow the view to `range`, still aliasing the same buffer.
    pub fn slice(&self, range: Range<usize>) -> Result<CoordView<'a>, MeshError> {
        check_range(&range, self.len)?;
        Ok(CoordView {
            data: self.data,
            offset: self.offset + range.start * self.stride,
            stride: self.stride,
            len: range.end - range.start,
        })
    }

    /// True if both views read the same memory with the same layout.
    pub fn aliases(&self, other: &CoordView<'_>) -> bool {
        std::ptr::eq(self.data.as_ptr(), other.data.as_ptr())
            && self.offset == other.offset
            && self.stride == other.stride
    }
}

impl PartialEq<[f64]> for CoordView<'_> {
    fn eq(&self, other: &[f64]) -> bool {
        self.len == other.len() && self.iter().zip(other).all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl<const N: usize> PartialEq<[f64; N]> for CoordView<'_> {
    fn eq(&self, other: &[f64; N]) -> bool {
        *self == other[..]
    }
}

/// Mutable strided view over one coordinate component.
#[derive(Debug)]
pub struct CoordViewMut<'a> {
    data: &'a mut [f64],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> CoordViewMut<'a> {
    /// Mutable view of component `dim` of an interleaved buffer.
    pub fn interleaved(data: &'a mut [f64], stride: usize, dim: usize) -> Self {
        let len = if stride == 0 { 0 } else { data.len() / stride };
        Self {
            data,
            offset: dim,
            stride,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry `i` of the view.
    pub fn get(&self, i: usize) -> Option<f64> {
        if i >= self.len {
            return None;
        }
        self.data.get(self.offset + i * self.stride).copied()
    }

    /// Overwrite entry `i`.
    pub fn set(&mut self, i: usize, value: f64) -> Result<(), MeshError> {
        if i >= self.len {
            return Err(MeshError::IndexOutOfRange(format!(
                "coordinate index {i} out of {} entries",
                self.len
            )));
        }
        self.data[self.offset + i * self.stride] = value;
        Ok(())
    }

    /// Iterate mutably over the viewed entries.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        let len = self.len;
        let stride = self.stride.max(1);
        self.data
            .get_mut(self.offset..)
            .unwrap_or_default()
            .iter_mut()
            .step_by(stride)
            .take(len)
    }
}

pub(crate) fn check_range(range: &Range<usize>, len: usize) -> Result<(), MeshError> {
    if range.start > range.end || range.end > len {
        return Err(MeshError::IndexOutOfRange(format!(
            "slice {}..{} exceeds {len} entries",
            range.start, range.end
        )));
    }
    Ok(())
}

/// Link state of one mesh location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkedLocation {
    /// Local entity count at this location.
    pub count: usize,
    /// Entities owned by the current partition.
    pub owned: usize,
    /// Whether coordinates were supplied for this location.
    pub has_coords: bool,
}

/// `[location][dimension]` index over the tables' coordinate buffers.
///
/// The store only records what was linked; the coordinate values themselves
/// stay in the node and element tables and are handed out as [`CoordView`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateStore {
    spatial_dim: usize,
    locations: [LinkedLocation; 2],
}

impl CoordinateStore {
    /// Link a committed node and element table pair.
    ///
    /// Returns the store together with the advisories raised while linking.
    pub fn link(
        spatial_dim: usize,
        node: LinkedLocation,
        element: LinkedLocation,
    ) -> (Self, Vec<Advisory>) {
        let mut advisories = Vec::new();
        if !element.has_coords {
            advisories.push(Advisory::ElementCoordsUnavailable);
        }
        log::debug!(
            "linked coordinates: {} nodes, {} elements, spatial dim {spatial_dim}",
            node.count,
            element.count
        );
        (
            Self {
                spatial_dim,
                locations: [node, element],
            },
            advisories,
        )
    }

    #[inline]
    pub fn spatial_dim(&self) -> usize {
        self.spatial_dim
    }

    /// Link metadata for a location.
    #[inline]
    pub fn location(&self, loc: MeshLocation) -> &LinkedLocation {
        &self.locations[loc.index()]
    }

    /// Check that `(dim, loc)` addresses linked coordinates.
    pub fn check_access(&self, dim: usize, loc: MeshLocation) -> Result<(), MeshError> {
        if dim >= self.spatial_dim {
            return Err(MeshError::IndexOutOfRange(format!(
                "coordinate dimension {dim} >= spatial dimension {}",
                self.spatial_dim
            )));
        }
        if !self.location(loc).has_coords {
            return Err(MeshError::IndexOutOfRange(format!(
                "{loc} coordinates were not linked"
            )));
        }
        Ok(())
    }
}
