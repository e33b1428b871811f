//! Structured logically-rectangular grid with per-stagger coordinate arrays.
//!
//! A grid has 1 to 3 dimensions. Its leading `periodic_dims` dimensions wrap
//! around. Dimension 0 is block-decomposed across the partitions of the
//! communicator; all other dimensions are owned entirely by every partition.
//!
//! Coordinate arrays cover the computational region of a stagger and are
//! stored flat with dimension 0 varying fastest. For centers that is the
//! owned region. Corner arrays also hold the upper corners of the last owned
//! cells, so every owned cell can be measured locally; where such a corner
//! belongs to the next partition, or lies past a periodic boundary, the
//! stored value is a halo copy filled from the wrapped global index.
//! Indices passed to and returned from the bound queries are global.

pub mod samples;

use crate::algs::communicator::{Communicator, block_range};
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Interpretation of the coordinate values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CoordSys {
    #[default]
    Cartesian,
    /// Longitude and latitude in degrees; an optional third dimension is a
    /// Cartesian height.
    SphericalDegrees,
}

/// Placement of grid coordinates within a cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StaggerLoc {
    Center,
    Corner,
}

impl StaggerLoc {
    pub const ALL: [StaggerLoc; 2] = [StaggerLoc::Center, StaggerLoc::Corner];

    #[inline]
    fn index(self) -> usize {
        match self {
            StaggerLoc::Center => 0,
            StaggerLoc::Corner => 1,
        }
    }
}

/// Per-cell data attached to the center stagger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GridItem {
    Mask,
    Area,
}

/// Construction parameters of a [`Grid`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Global cell count per dimension.
    pub max_index: Vec<usize>,
    /// Number of leading periodic dimensions.
    #[serde(default)]
    pub periodic_dims: usize,
    #[serde(default)]
    pub coord_sys: CoordSys,
    #[serde(default)]
    pub halo_width: usize,
}

impl GridSpec {
    pub fn new(max_index: &[usize]) -> Self {
        Self {
            max_index: max_index.to_vec(),
            periodic_dims: 0,
            coord_sys: CoordSys::Cartesian,
            halo_width: 0,
        }
    }

    pub fn with_periodic_dims(mut self, periodic_dims: usize) -> Self {
        self.periodic_dims = periodic_dims;
        self
    }

    pub fn with_coord_sys(mut self, coord_sys: CoordSys) -> Self {
        self.coord_sys = coord_sys;
        self
    }

    pub fn with_halo_width(mut self, halo_width: usize) -> Self {
        self.halo_width = halo_width;
        self
    }

    fn validate(&self, partitions: usize) -> Result<(), MeshError> {
        let ndims = self.max_index.len();
        if !(1..=3).contains(&ndims) {
            return Err(MeshError::Configuration(format!(
                "grids need 1 to 3 dimensions, got {ndims}"
            )));
        }
        if let Some(d) = self.max_index.iter().position(|&n| n == 0) {
            return Err(MeshError::Configuration(format!(
                "dimension {d} has no cells"
            )));
        }
        if self.periodic_dims > ndims {
            return Err(MeshError::Configuration(format!(
                "{} periodic dimensions on a {ndims}-dimensional grid",
                self.periodic_dims
            )));
        }
        if self.coord_sys == CoordSys::SphericalDegrees && ndims < 2 {
            return Err(MeshError::Configuration(
                "spherical grids need longitude and latitude dimensions".into(),
            ));
        }
        if partitions > self.max_index[0] {
            return Err(MeshError::Configuration(format!(
                "{partitions} partitions for {} cells in dimension 0",
                self.max_index[0]
            )));
        }
        Ok(())
    }
}

/// Region of one stagger: owned `[lower, upper)` and stored
/// `[lower, stored_upper)` per dimension, in unwrapped global indices.
#[derive(Clone, Debug)]
struct StaggerRegion {
    lower: Vec<usize>,
    upper: Vec<usize>,
    stored_upper: Vec<usize>,
    coords: Option<Vec<Vec<f64>>>,
}

fn shape(lower: &[usize], upper: &[usize]) -> Vec<usize> {
    lower.iter().zip(upper).map(|(l, u)| u - l).collect()
}

impl StaggerRegion {
    fn stored_count(&self) -> usize {
        shape(&self.lower, &self.stored_upper).iter().product()
    }

    /// Flat offset of an unwrapped global index inside the stored region.
    fn offset(&self, global: &[usize]) -> Option<usize> {
        let mut offset = 0;
        let mut stride = 1;
        for ((&g, &lo), &hi) in global.iter().zip(&self.lower).zip(&self.stored_upper) {
            if g < lo || g >= hi {
                return None;
            }
            offset += (g - lo) * stride;
            stride *= hi - lo;
        }
        Some(offset)
    }
}

/// Global index of flat offset `flat` in the region `[lower, upper)`.
fn decode_index(lower: &[usize], upper: &[usize], mut flat: usize, out: &mut [usize]) {
    for ((slot, &lo), &hi) in out.iter_mut().zip(lower).zip(upper) {
        let extent = hi - lo;
        *slot = lo + flat % extent;
        flat /= extent;
    }
}

pub struct Grid {
    spec: GridSpec,
    comm: Arc<dyn Communicator>,
    regions: [StaggerRegion; 2],
    mask: Option<Vec<i32>>,
    area: Option<Vec<f64>>,
}

impl Grid {
    /// Create a grid and compute the owned and stored regions of every stagger.
    ///
    /// No coordinates are allocated; see [`Grid::add_coords`].
    pub fn new(spec: GridSpec, comm: Arc<dyn Communicator>) -> Result<Self, MeshError> {
        spec.validate(comm.size())?;
        let regions = StaggerLoc::ALL.map(|stagger| {
            let (lower, upper): (Vec<usize>, Vec<usize>) = (0..spec.max_index.len())
                .map(|d| {
                    let r = Self::owned_range(&spec, comm.as_ref(), stagger, d);
                    (r.start, r.end)
                })
                .unzip();
            let stored_upper = match stagger {
                StaggerLoc::Center => upper.clone(),
                // one past the upper center of each dimension
                StaggerLoc::Corner => (0..spec.max_index.len())
                    .map(|d| {
                        let centers = Self::owned_range(&spec, comm.as_ref(), StaggerLoc::Center, d);
                        upper[d].max(centers.end + 1)
                    })
                    .collect(),
            };
            StaggerRegion {
                lower,
                upper,
                stored_upper,
                coords: None,
            }
        });
        Ok(Self {
            spec,
            comm,
            regions,
            mask: None,
            area: None,
        })
    }

    fn owned_range(
        spec: &GridSpec,
        comm: &dyn Communicator,
        stagger: StaggerLoc,
        dim: usize,
    ) -> Range<usize> {
        let extent = stagger_extent(spec, stagger, dim);
        if dim != 0 {
            return 0..extent;
        }
        let mut range = block_range(spec.max_index[0], comm.rank(), comm.size());
        if extent > spec.max_index[0] && comm.rank() + 1 == comm.size() {
            range.end = extent;
        }
        range
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.spec.max_index.len()
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn coord_sys(&self) -> CoordSys {
        self.spec.coord_sys
    }

    pub fn communicator(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    pub fn is_periodic(&self, dim: usize) -> bool {
        dim < self.spec.periodic_dims
    }

    /// Global index extent of `stagger` along `dim`.
    pub fn extent(&self, stagger: StaggerLoc, dim: usize) -> Option<usize> {
        (dim < self.ndims()).then(|| stagger_extent(&self.spec, stagger, dim))
    }

    fn region(&self, stagger: StaggerLoc) -> &StaggerRegion {
        &self.regions[stagger.index()]
    }

    fn check_dim(&self, dim: usize) -> Result<(), MeshError> {
        if dim >= self.ndims() {
            return Err(MeshError::IndexOutOfRange(format!(
                "grid dimension {dim} >= {}",
                self.ndims()
            )));
        }
        Ok(())
    }

    /// Allocate zeroed coordinate arrays for `stagger`. No-op if present.
    pub fn add_coords(&mut self, stagger: StaggerLoc) {
        let ndims = self.ndims();
        let region = &mut self.regions[stagger.index()];
        if region.coords.is_some() {
            return;
        }
        let count = region.stored_count();
        region.coords = Some(vec![vec![0.0; count]; ndims]);
        log::debug!("allocated {stagger:?} coordinates: {count} points x {ndims} dims");
    }

    pub fn has_coords(&self, stagger: StaggerLoc) -> bool {
        self.region(stagger).coords.is_some()
    }

    /// Inclusive lower global index of the owned region, per dimension.
    pub fn lower_bounds(&self, stagger: StaggerLoc) -> &[usize] {
        &self.region(stagger).lower
    }

    /// Exclusive upper global index of the owned region, per dimension.
    pub fn upper_bounds(&self, stagger: StaggerLoc) -> &[usize] {
        &self.region(stagger).upper
    }

    /// Exclusive upper bounds of the stored coordinate arrays, per dimension.
    ///
    /// Equal to [`Grid::upper_bounds`] for centers. For corners it reaches one
    /// past the last owned center; on periodic dimensions that index may equal
    /// the extent and denotes the wrapped corner 0.
    pub fn computational_upper_bounds(&self, stagger: StaggerLoc) -> &[usize] {
        &self.region(stagger).stored_upper
    }

    /// Shape of the stored coordinate arrays of `stagger`.
    pub fn computational_shape(&self, stagger: StaggerLoc) -> Vec<usize> {
        let region = self.region(stagger);
        shape(&region.lower, &region.stored_upper)
    }

    pub fn owned_index_bounds(
        &self,
        stagger: StaggerLoc,
        dim: usize,
    ) -> Result<Range<usize>, MeshError> {
        self.check_dim(dim)?;
        let region = self.region(stagger);
        Ok(region.lower[dim]..region.upper[dim])
    }

    /// Owned bounds widened by the halo width.
    ///
    /// Clamped to the global extent on non-periodic dimensions; on periodic
    /// dimensions the bounds may run past either end and are resolved with
    /// [`Grid::wrap_index`].
    pub fn halo_index_bounds(
        &self,
        stagger: StaggerLoc,
        dim: usize,
    ) -> Result<Range<isize>, MeshError> {
        let owned = self.owned_index_bounds(stagger, dim)?;
        let halo = self.spec.halo_width as isize;
        let lower = owned.start as isize - halo;
        let upper = owned.end as isize + halo;
        if self.is_periodic(dim) {
            return Ok(lower..upper);
        }
        let extent = stagger_extent(&self.spec, stagger, dim) as isize;
        Ok(lower.max(0)..upper.min(extent))
    }

    /// Shape of the owned region of `stagger`.
    pub fn local_shape(&self, stagger: StaggerLoc) -> Vec<usize> {
        let region = self.region(stagger);
        shape(&region.lower, &region.upper)
    }

    /// Number of owned points of `stagger`.
    pub fn local_count(&self, stagger: StaggerLoc) -> usize {
        self.local_shape(stagger).iter().product()
    }

    /// Map a possibly out-of-range global index into `[0, extent)`.
    pub fn wrap_index(&self, stagger: StaggerLoc, dim: usize, index: isize) -> Option<usize> {
        if dim >= self.ndims() {
            return None;
        }
        let extent = stagger_extent(&self.spec, stagger, dim) as isize;
        if self.is_periodic(dim) {
            Some(index.rem_euclid(extent) as usize)
        } else if (0..extent).contains(&index) {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Flat coordinates of component `dim` over the computational region of
    /// `stagger`.
    pub fn get_coords(&self, dim: usize, stagger: StaggerLoc) -> Result<&[f64], MeshError> {
        self.check_dim(dim)?;
        self.region(stagger)
            .coords
            .as_ref()
            .map(|c| c[dim].as_slice())
            .ok_or_else(|| MeshError::IndexOutOfRange(format!("{stagger:?} coordinates were not added")))
    }

    pub fn get_coords_mut(
        &mut self,
        dim: usize,
        stagger: StaggerLoc,
    ) -> Result<&mut [f64], MeshError> {
        self.check_dim(dim)?;
        self.regions[stagger.index()]
            .coords
            .as_mut()
            .map(|c| c[dim].as_mut_slice())
            .ok_or_else(|| MeshError::IndexOutOfRange(format!("{stagger:?} coordinates were not added")))
    }

    /// Set component `dim` at every stored point of `stagger` from its
    /// wrapped global index.
    pub fn fill_coords<F>(&mut self, dim: usize, stagger: StaggerLoc, f: F) -> Result<(), MeshError>
    where
        F: Fn(&[usize]) -> f64,
    {
        self.check_dim(dim)?;
        let extents: Vec<usize> = (0..self.ndims())
            .map(|d| stagger_extent(&self.spec, stagger, d))
            .collect();
        let mut index = vec![0; self.ndims()];
        let StaggerRegion {
            lower,
            stored_upper,
            coords,
            ..
        } = &mut self.regions[stagger.index()];
        let coords = coords.as_mut().ok_or_else(|| {
            MeshError::IndexOutOfRange(format!("{stagger:?} coordinates were not added"))
        })?;
        for (flat, value) in coords[dim].iter_mut().enumerate() {
            decode_index(lower, stored_upper, flat, &mut index);
            for (i, &extent) in index.iter_mut().zip(&extents) {
                *i %= extent;
            }
            *value = f(&index);
        }
        Ok(())
    }

    /// Wrapped global indices of the stored points of `stagger`, in storage
    /// order. For centers these are exactly the owned points.
    pub fn local_indices(&self, stagger: StaggerLoc) -> impl Iterator<Item = Vec<usize>> + '_ {
        let region = self.region(stagger);
        let extents: Vec<usize> = (0..self.ndims())
            .map(|d| stagger_extent(&self.spec, stagger, d))
            .collect();
        (0..region.stored_count()).map(move |flat| {
            let mut index = vec![0; region.lower.len()];
            decode_index(&region.lower, &region.stored_upper, flat, &mut index);
            for (i, &extent) in index.iter_mut().zip(&extents) {
                *i %= extent;
            }
            index
        })
    }

    /// Coordinate component `dim` at a global index.
    ///
    /// An index inside the stored region is read as is; anything else is
    /// wrapped first, so periodic indices past either end resolve to the
    /// stored point they alias.
    pub fn coord_at(
        &self,
        dim: usize,
        stagger: StaggerLoc,
        index: &[isize],
    ) -> Result<f64, MeshError> {
        if index.len() != self.ndims() {
            return Err(MeshError::DimensionMismatch {
                what: "grid index",
                expected: self.ndims(),
                found: index.len(),
            });
        }
        let region = self.region(stagger);
        let global = index
            .iter()
            .enumerate()
            .map(|(d, &i)| {
                let stored = region.lower[d] as isize..region.stored_upper[d] as isize;
                if stored.contains(&i) {
                    return Ok(i as usize);
                }
                self.wrap_index(stagger, d, i).ok_or_else(|| {
                    MeshError::IndexOutOfRange(format!("index {i} outside dimension {d}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let coords = self.get_coords(dim, stagger)?;
        let offset = region.offset(&global).ok_or_else(|| {
            MeshError::IndexOutOfRange(format!("{stagger:?} index {global:?} is not stored locally"))
        })?;
        Ok(coords[offset])
    }

    /// Allocate a zeroed center-stagger item. No-op if present.
    pub fn add_item(&mut self, item: GridItem) {
        let count = self.local_count(StaggerLoc::Center);
        match item {
            GridItem::Mask => {
                self.mask.get_or_insert_with(|| vec![0; count]);
            }
            GridItem::Area => {
                self.area.get_or_insert_with(|| vec![0.0; count]);
            }
        }
    }

    pub fn mask(&self) -> Option<&[i32]> {
        self.mask.as_deref()
    }

    pub fn mask_mut(&mut self) -> Option<&mut [i32]> {
        self.mask.as_deref_mut()
    }

    pub fn area(&self) -> Option<&[f64]> {
        self.area.as_deref()
    }

    pub fn area_mut(&mut self) -> Option<&mut [f64]> {
        self.area.as_deref_mut()
    }

    /// Measure of every owned center cell, in storage order.
    ///
    /// The area item wins if present. Otherwise cells are measured from the
    /// corner coordinates: Cartesian cells by the product of their edge
    /// lengths, spherical cells by their area on the unit sphere (times the
    /// height for a third dimension). Stepping past a periodic boundary is
    /// only defined for a spherical longitude.
    pub fn cell_measures(&self) -> Result<Vec<f64>, MeshError> {
        if let Some(area) = &self.area {
            return Ok(area.clone());
        }
        self.local_indices(StaggerLoc::Center)
            .map(|index| self.cell_measure(&index))
            .collect()
    }

    /// Corner-coordinate spacing of cell `index` along `dim`.
    fn spacing(&self, index: &[usize], dim: usize) -> Result<f64, MeshError> {
        let lo: Vec<isize> = index.iter().map(|&i| i as isize).collect();
        let mut hi = lo.clone();
        hi[dim] += 1;
        let a = self.coord_at(dim, StaggerLoc::Corner, &lo)?;
        let b = self.coord_at(dim, StaggerLoc::Corner, &hi)?;
        let wrapped = hi[dim] as usize >= stagger_extent(&self.spec, StaggerLoc::Corner, dim);
        if !wrapped {
            return Ok(b - a);
        }
        match (self.coord_sys(), dim) {
            (CoordSys::SphericalDegrees, 0) => Ok(b + 360.0 - a),
            _ => Err(MeshError::Configuration(format!(
                "period of dimension {dim} is unknown; add an area item"
            ))),
        }
    }

    fn cell_measure(&self, index: &[usize]) -> Result<f64, MeshError> {
        match self.coord_sys() {
            CoordSys::Cartesian => (0..self.ndims())
                .map(|d| self.spacing(index, d).map(f64::abs))
                .product(),
            CoordSys::SphericalDegrees => {
                let d2r = PI / 180.0;
                let dlon = self.spacing(index, 0)? * d2r;
                let south: Vec<isize> = index.iter().map(|&i| i as isize).collect();
                let mut north = south.clone();
                north[1] += 1;
                let lat0 = self.coord_at(1, StaggerLoc::Corner, &south)? * d2r;
                let lat1 = self.coord_at(1, StaggerLoc::Corner, &north)? * d2r;
                let mut measure = (dlon * (lat1.sin() - lat0.sin())).abs();
                if self.ndims() == 3 {
                    measure *= self.spacing(index, 2)?.abs();
                }
                Ok(measure)
            }
        }
    }
}

fn stagger_extent(spec: &GridSpec, stagger: StaggerLoc, dim: usize) -> usize {
    let cells = spec.max_index[dim];
    match stagger {
        StaggerLoc::Center => cells,
        StaggerLoc::Corner if dim < spec.periodic_dims => cells,
        StaggerLoc::Corner => cells + 1,
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("spec", &self.spec)
            .field("rank", &self.comm.rank())
            .field("center", &(self.lower_bounds(StaggerLoc::Center), self.upper_bounds(StaggerLoc::Center)))
            .field("corner", &(self.lower_bounds(StaggerLoc::Corner), self.upper_bounds(StaggerLoc::Corner)))
            .finish()
    }
}
