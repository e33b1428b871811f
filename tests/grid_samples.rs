use regrid_mesh::grid::samples::{
    SampleOptions, UNINITIALIZED, compute_mass_grid, grid_create, grid_create_3d,
    grid_create_periodic, initialize_field_grid, initialize_field_grid_periodic,
};
use regrid_mesh::prelude::*;
use std::sync::Arc;

fn all_parts() -> SampleOptions {
    SampleOptions {
        corners: true,
        mask: true,
        area: true,
    }
}

#[test]
fn partitions_tile_the_global_grid() {
    let size = 3;
    let mut centers = Vec::new();
    let mut corner_counts = Vec::new();
    for rank in 0..size {
        let comm = Arc::new(LocalComm::new(rank, size).unwrap());
        let grid = grid_create([0.0, 7.0], [0.0, 2.0], 7, 2, all_parts(), comm).unwrap();
        let range = grid.owned_index_bounds(StaggerLoc::Center, 0).unwrap();
        centers.push(range);
        corner_counts.push(grid.local_shape(StaggerLoc::Corner)[0]);
        assert_eq!(grid.mask().unwrap().len(), grid.local_count(StaggerLoc::Center));
    }
    assert_eq!(centers, vec![0..3, 3..5, 5..7]);
    assert_eq!(corner_counts, vec![3, 2, 3]);
}

#[test]
fn sample_mass_uses_the_area_item() {
    let grid = grid_create([0.0, 4.0], [0.0, 4.0], 4, 4, all_parts(), Arc::new(NoComm)).unwrap();
    let values = initialize_field_grid(&grid, true).unwrap();
    let expected: f64 = values.iter().map(|v| 5.0 * v).sum();
    let mass = compute_mass_grid(&grid, &values, None, UNINITIALIZED).unwrap();
    assert!((mass - expected).abs() < 1e-9);
}

#[test]
fn cartesian_mass_without_area_uses_cell_size() {
    let options = SampleOptions {
        corners: true,
        ..SampleOptions::default()
    };
    let grid = grid_create_3d(
        [0.0, 2.0],
        [0.0, 2.0],
        [0.0, 2.0],
        2,
        2,
        2,
        options,
        Arc::new(NoComm),
    )
    .unwrap();
    let ones = vec![1.0; grid.local_count(StaggerLoc::Center)];
    let mass = compute_mass_grid(&grid, &ones, None, UNINITIALIZED).unwrap();
    assert_eq!(mass, 8.0);
}

#[test]
fn partitioned_mass_without_area_adds_up() {
    let options = SampleOptions {
        corners: true,
        ..SampleOptions::default()
    };
    let mut total = 0.0;
    for rank in 0..2 {
        let comm = Arc::new(LocalComm::new(rank, 2).unwrap());
        let grid = grid_create([0.0, 4.0], [0.0, 4.0], 4, 4, options, comm).unwrap();
        let ones = vec![1.0; grid.local_count(StaggerLoc::Center)];
        let mass = compute_mass_grid(&grid, &ones, None, UNINITIALIZED).unwrap();
        assert_eq!(mass, 8.0);
        total += mass;
    }
    assert_eq!(total, 16.0);

    let mut sphere = 0.0;
    for rank in 0..3 {
        let comm = Arc::new(LocalComm::new(rank, 3).unwrap());
        let grid = grid_create_periodic(36, 18, options, comm).unwrap();
        let ones = vec![1.0; grid.local_count(StaggerLoc::Center)];
        sphere += compute_mass_grid(&grid, &ones, None, UNINITIALIZED).unwrap();
    }
    assert!((sphere - 4.0 * std::f64::consts::PI).abs() < 1e-9);
}

#[test]
fn periodic_mass_of_a_constant_is_the_sphere_area() {
    let options = SampleOptions {
        corners: true,
        ..SampleOptions::default()
    };
    let grid = grid_create_periodic(36, 18, options, Arc::new(NoComm)).unwrap();
    let ones = vec![1.0; grid.local_count(StaggerLoc::Center)];
    let mass = compute_mass_grid(&grid, &ones, None, UNINITIALIZED).unwrap();
    assert!((mass - 4.0 * std::f64::consts::PI).abs() < 1e-9);

    let field = initialize_field_grid_periodic(&grid).unwrap();
    assert!(field.iter().all(|v| (1.0..=3.0).contains(v)));
}

#[test]
fn missing_corners_make_measures_unavailable() {
    let grid = grid_create([0.0, 1.0], [0.0, 1.0], 2, 2, SampleOptions::default(), Arc::new(NoComm))
        .unwrap();
    assert!(matches!(
        grid.cell_measures(),
        Err(MeshError::IndexOutOfRange(_))
    ));
}

#[test]
fn grid_spec_deserializes_with_defaults() {
    let spec: GridSpec =
        serde_json::from_str(r#"{"max_index": [10, 5], "coord_sys": "SphericalDegrees"}"#).unwrap();
    assert_eq!(spec.periodic_dims, 0);
    assert_eq!(spec.halo_width, 0);
    assert_eq!(spec.coord_sys, CoordSys::SphericalDegrees);
    let grid = Grid::new(spec, Arc::new(NoComm)).unwrap();
    assert_eq!(grid.local_shape(StaggerLoc::Corner), vec![11, 6]);
}
