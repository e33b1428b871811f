//! Sample grids and analytic fields for regridding demonstrations.
//!
//! Each builder lays out evenly spaced cell edges over a domain, sets the
//! center coordinates (and optionally the corners) of the local region, and can attach a mask and a constant area item. The analytic
//! initializers evaluate a smooth function at the owned cell centers.

use super::{CoordSys, Grid, GridItem, GridSpec, StaggerLoc};
use crate::algs::communicator::Communicator;
use crate::mesh_error::MeshError;
use std::sync::Arc;

/// Value marking a destination cell untouched by a regrid.
pub const UNINITIALIZED: f64 = 422_397_696.0;

/// Constant cell area used when [`SampleOptions::area`] is set.
pub const SAMPLE_AREA: f64 = 5.0;

/// Which optional parts a sample builder adds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SampleOptions {
    pub corners: bool,
    pub mask: bool,
    pub area: bool,
}

/// `n + 1` evenly spaced edges over `[lo, hi]`.
fn edges(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| lo + (hi - lo) * i as f64 / n as f64)
        .collect()
}

fn centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

fn build(
    spec: GridSpec,
    axes: &[Vec<f64>],
    options: SampleOptions,
    comm: Arc<dyn Communicator>,
) -> Result<Grid, MeshError> {
    let mut grid = Grid::new(spec, comm)?;
    let mids: Vec<Vec<f64>> = axes.iter().map(|e| centers(e)).collect();

    grid.add_coords(StaggerLoc::Center);
    for (dim, values) in mids.iter().enumerate() {
        grid.fill_coords(dim, StaggerLoc::Center, |i| values[i[dim]])?;
    }
    if options.corners {
        grid.add_coords(StaggerLoc::Corner);
        for (dim, values) in axes.iter().enumerate() {
            grid.fill_coords(dim, StaggerLoc::Corner, |i| values[i[dim]])?;
        }
    }
    if options.mask {
        let three_d = grid.ndims() == 3;
        let mask: Vec<i32> = grid
            .local_indices(StaggerLoc::Center)
            .map(|i| {
                let inside = i.iter().enumerate().all(|(dim, &g)| {
                    let x = mids[dim][g];
                    // 3-D cartesian samples exclude the lower edge
                    let above = if three_d && grid.coord_sys() == CoordSys::Cartesian {
                        1.75 < x
                    } else {
                        1.75 <= x
                    };
                    above && x < 2.25
                });
                if inside { 0 } else { 1 }
            })
            .collect();
        grid.add_item(GridItem::Mask);
        if let Some(slot) = grid.mask_mut() {
            slot.copy_from_slice(&mask);
        }
    }
    if options.area {
        grid.add_item(GridItem::Area);
        if let Some(area) = grid.area_mut() {
            area.fill(SAMPLE_AREA);
        }
    }
    Ok(grid)
}

/// 2-D Cartesian grid of `nx` by `ny` cells over `xdom` x `ydom`.
pub fn grid_create(
    xdom: [f64; 2],
    ydom: [f64; 2],
    nx: usize,
    ny: usize,
    options: SampleOptions,
    comm: Arc<dyn Communicator>,
) -> Result<Grid, MeshError> {
    build(
        GridSpec::new(&[nx, ny]),
        &[edges(xdom[0], xdom[1], nx), edges(ydom[0], ydom[1], ny)],
        options,
        comm,
    )
}

/// Global longitude/latitude grid, periodic in longitude.
pub fn grid_create_periodic(
    nlon: usize,
    nlat: usize,
    options: SampleOptions,
    comm: Arc<dyn Communicator>,
) -> Result<Grid, MeshError> {
    build(
        GridSpec::new(&[nlon, nlat])
            .with_periodic_dims(1)
            .with_coord_sys(CoordSys::SphericalDegrees),
        &[edges(-180.0, 180.0, nlon), edges(-90.0, 90.0, nlat)],
        options,
        comm,
    )
}

/// 3-D Cartesian grid.
#[allow(clippy::too_many_arguments)]
pub fn grid_create_3d(
    xdom: [f64; 2],
    ydom: [f64; 2],
    zdom: [f64; 2],
    nx: usize,
    ny: usize,
    nz: usize,
    options: SampleOptions,
    comm: Arc<dyn Communicator>,
) -> Result<Grid, MeshError> {
    build(
        GridSpec::new(&[nx, ny, nz]),
        &[
            edges(xdom[0], xdom[1], nx),
            edges(ydom[0], ydom[1], ny),
            edges(zdom[0], zdom[1], nz),
        ],
        options,
        comm,
    )
}

/// Global longitude/latitude grid with `nz` levels over a height of 10.
pub fn grid_create_periodic_3d(
    nlon: usize,
    nlat: usize,
    nz: usize,
    options: SampleOptions,
    comm: Arc<dyn Communicator>,
) -> Result<Grid, MeshError> {
    build(
        GridSpec::new(&[nlon, nlat, nz])
            .with_periodic_dims(1)
            .with_coord_sys(CoordSys::SphericalDegrees),
        &[
            edges(-180.0, 180.0, nlon),
            edges(-90.0, 90.0, nlat),
            edges(0.0, 10.0, nz),
        ],
        options,
        comm,
    )
}

fn center_coords(grid: &Grid) -> Result<Vec<&[f64]>, MeshError> {
    (0..grid.ndims())
        .map(|d| grid.get_coords(d, StaggerLoc::Center))
        .collect()
}

fn apply_mask(grid: &Grid, values: &mut [f64]) -> Result<(), MeshError> {
    let mask = grid
        .mask()
        .ok_or_else(|| MeshError::InvalidState("grid has no mask item".into()))?;
    for (v, &m) in values.iter_mut().zip(mask) {
        if m == 0 {
            *v = 0.0;
        }
    }
    Ok(())
}

/// `20 + x^2 + xy + y^2` at the owned centers; masked cells are zero.
pub fn initialize_field_grid(grid: &Grid, use_mask: bool) -> Result<Vec<f64>, MeshError> {
    let coords = center_coords(grid)?;
    let [x, y, ..] = coords[..] else {
        return Err(MeshError::Configuration("field needs a 2-D grid".into()));
    };
    let mut values: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(x, y)| 20.0 + x * x + x * y + y * y)
        .collect();
    if use_mask {
        apply_mask(grid, &mut values)?;
    }
    Ok(values)
}

fn periodic_value(lon: f64, lat: f64) -> f64 {
    let d2r = std::f64::consts::PI / 180.0;
    2.0 + (d2r * lon).cos().powi(2) * (2.0 * d2r * (90.0 - lat)).cos()
}

/// `2 + cos^2(lon) cos(2 (90 - lat))` at the owned centers, angles in degrees.
pub fn initialize_field_grid_periodic(grid: &Grid) -> Result<Vec<f64>, MeshError> {
    let coords = center_coords(grid)?;
    let [lon, lat, ..] = coords[..] else {
        return Err(MeshError::Configuration("field needs a 2-D grid".into()));
    };
    Ok(lon
        .iter()
        .zip(lat)
        .map(|(&lon, &lat)| periodic_value(lon, lat))
        .collect())
}

/// The periodic field plus `5 z`.
pub fn initialize_field_grid_periodic_3d(grid: &Grid) -> Result<Vec<f64>, MeshError> {
    let coords = center_coords(grid)?;
    let [lon, lat, z] = coords[..] else {
        return Err(MeshError::Configuration("field needs a 3-D grid".into()));
    };
    Ok(lon
        .iter()
        .zip(lat)
        .zip(z)
        .map(|((&lon, &lat), &z)| periodic_value(lon, lat) + 5.0 * z)
        .collect())
}

/// `20 + x^2 + xy + z^2` at the owned centers; masked cells are zero.
pub fn initialize_field_grid_3d(grid: &Grid, use_mask: bool) -> Result<Vec<f64>, MeshError> {
    let coords = center_coords(grid)?;
    let [x, y, z] = coords[..] else {
        return Err(MeshError::Configuration("field needs a 3-D grid".into()));
    };
    let mut values: Vec<f64> = x
        .iter()
        .zip(y)
        .zip(z)
        .map(|((x, y), z)| 20.0 + x * x + x * y + z * z)
        .collect();
    if use_mask {
        apply_mask(grid, &mut values)?;
    }
    Ok(values)
}

/// Sum of `measure * value [* fraction]` over the owned cells whose value is
/// not `uninit`.
pub fn compute_mass_grid(
    grid: &Grid,
    values: &[f64],
    fractions: Option<&[f64]>,
    uninit: f64,
) -> Result<f64, MeshError> {
    let measures = grid.cell_measures()?;
    if values.len() != measures.len() {
        return Err(MeshError::DimensionMismatch {
            what: "field values",
            expected: measures.len(),
            found: values.len(),
        });
    }
    if let Some(frac) = fractions {
        if frac.len() != measures.len() {
            return Err(MeshError::DimensionMismatch {
                what: "field fractions",
                expected: measures.len(),
                found: frac.len(),
            });
        }
    }
    Ok(measures
        .iter()
        .zip(values)
        .enumerate()
        .filter(|(_, (_, v))| **v != uninit)
        .map(|(i, (a, v))| a * v * fractions.map_or(1.0, |f| f[i]))
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{LocalComm, NoComm};

    fn opts(corners: bool, mask: bool, area: bool) -> SampleOptions {
        SampleOptions {
            corners,
            mask,
            area,
        }
    }

    #[test]
    fn cartesian_grid_centers_and_corners() {
        let grid = grid_create([0.0, 4.0], [0.0, 2.0], 4, 2, opts(true, false, false), Arc::new(NoComm))
            .unwrap();
        assert_eq!(
            grid.get_coords(0, StaggerLoc::Center).unwrap(),
            &[0.5, 1.5, 2.5, 3.5, 0.5, 1.5, 2.5, 3.5]
        );
        assert_eq!(grid.coord_at(1, StaggerLoc::Center, &[0, 1]).unwrap(), 1.5);
        assert_eq!(grid.local_shape(StaggerLoc::Corner), vec![5, 3]);
        assert_eq!(grid.coord_at(0, StaggerLoc::Corner, &[4, 2]).unwrap(), 4.0);
        assert_eq!(grid.cell_measures().unwrap(), vec![1.0; 8]);
    }

    #[test]
    fn mask_zeroes_the_cell_around_two_two() {
        let grid = grid_create([0.0, 4.0], [0.0, 4.0], 8, 8, opts(false, true, false), Arc::new(NoComm))
            .unwrap();
        // centers sit at 0.25 + 0.5 k; only 1.75 falls in [1.75, 2.25)
        let mask = grid.mask().unwrap();
        assert_eq!(mask.iter().filter(|&&m| m == 0).count(), 1);
        let values = initialize_field_grid(&grid, true).unwrap();
        let masked = 3 + 3 * 8;
        assert_eq!(mask[masked], 0);
        assert_eq!(values[masked], 0.0);
        assert_eq!(values[0], 20.0 + 3.0 * 0.25 * 0.25);
    }

    #[test]
    fn field_with_mask_requires_mask_item() {
        let grid = grid_create([0.0, 1.0], [0.0, 1.0], 2, 2, SampleOptions::default(), Arc::new(NoComm))
            .unwrap();
        assert!(matches!(
            initialize_field_grid(&grid, true),
            Err(MeshError::InvalidState(_))
        ));
    }

    #[test]
    fn periodic_grid_wraps_longitude_corners() {
        let grid = grid_create_periodic(4, 2, opts(true, false, false), Arc::new(NoComm)).unwrap();
        assert_eq!(grid.local_shape(StaggerLoc::Corner), vec![4, 3]);
        assert_eq!(grid.coord_at(0, StaggerLoc::Corner, &[4, 0]).unwrap(), -180.0);
        let values = initialize_field_grid_periodic(&grid).unwrap();
        // lon -135, lat -45: cos^2(-135) = 0.5, cos(270) = 0
        assert!((values[0] - 2.0).abs() < 1e-12);
        let total: f64 = grid.cell_measures().unwrap().iter().sum();
        assert!((total - 4.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn periodic_3d_field_adds_height() {
        let grid = grid_create_periodic_3d(4, 2, 2, SampleOptions::default(), Arc::new(NoComm)).unwrap();
        let values = initialize_field_grid_periodic_3d(&grid).unwrap();
        let top = 4 * 2;
        assert!((values[top] - values[0] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn mass_skips_uninitialized_cells() {
        let grid = grid_create([0.0, 2.0], [0.0, 1.0], 2, 1, opts(false, false, true), Arc::new(NoComm))
            .unwrap();
        let mass = compute_mass_grid(&grid, &[1.0, UNINITIALIZED], None, UNINITIALIZED).unwrap();
        assert_eq!(mass, SAMPLE_AREA);
        let mass = compute_mass_grid(&grid, &[1.0, 2.0], Some(&[0.5, 1.0]), UNINITIALIZED).unwrap();
        assert_eq!(mass, SAMPLE_AREA * 2.5);
        assert!(compute_mass_grid(&grid, &[1.0], None, UNINITIALIZED).is_err());
    }

    #[test]
    fn partitions_fill_only_their_block() {
        let comm = Arc::new(LocalComm::new(1, 2).unwrap());
        let grid = grid_create_3d(
            [0.0, 4.0],
            [0.0, 1.0],
            [0.0, 1.0],
            4,
            1,
            1,
            opts(true, false, false),
            comm,
        )
        .unwrap();
        assert_eq!(grid.get_coords(0, StaggerLoc::Center).unwrap(), &[2.5, 3.5]);
        assert_eq!(grid.local_shape(StaggerLoc::Corner), vec![3, 2, 2]);
        assert_eq!(grid.cell_measures().unwrap(), vec![1.0, 1.0]);
        let values = initialize_field_grid_3d(&grid, false).unwrap();
        assert_eq!(values[0], 20.0 + 2.5 * 2.5 + 2.5 * 0.5 + 0.25);
    }
}
