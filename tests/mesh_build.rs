use proptest::prelude::*;
use regrid_mesh::prelude::*;

fn unit_square() -> Mesh {
    let mut mesh = Mesh::new(2, 2).unwrap();
    mesh.add_nodes(
        &[0, 1, 2, 3],
        &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        &[0, 0, 0, 0],
    )
    .unwrap();
    mesh.add_elements(
        &[0],
        &[ElementType::Quadrilateral],
        &[0, 1, 2, 3],
        ElementFields::default(),
    )
    .unwrap();
    mesh
}

#[test]
fn single_quad_reads_back_its_coordinates() {
    let mesh = unit_square();
    assert_eq!(mesh.node_count().unwrap(), 4);
    assert_eq!(mesh.element_count().unwrap(), 1);
    assert_eq!(
        mesh.get_coords(0, MeshLocation::Node).unwrap().to_vec(),
        vec![0.0, 1.0, 1.0, 0.0]
    );
    assert_eq!(
        mesh.get_coords(1, MeshLocation::Node).unwrap().to_vec(),
        vec![0.0, 0.0, 1.0, 1.0]
    );
    assert!(mesh.get_coords(2, MeshLocation::Node).is_err());
}

#[test]
fn quad_with_three_nodes_is_a_topology_mismatch() {
    let mut mesh = Mesh::new(2, 2).unwrap();
    mesh.add_nodes(&[0, 1, 2], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0; 3])
        .unwrap();
    let err = mesh
        .add_elements(
            &[9],
            &[ElementType::Quadrilateral],
            &[0, 1, 2],
            ElementFields::default(),
        )
        .unwrap_err();
    assert!(
        matches!(err, MeshError::TopologyMismatch { element: 9, .. }),
        "unexpected error: {err:?}"
    );
}

#[test]
fn volume_elements_are_rejected_on_a_surface_mesh() {
    let mut mesh = Mesh::new(2, 3).unwrap();
    mesh.add_nodes(
        &[0, 1, 2, 3],
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        &[0; 4],
    )
    .unwrap();
    let err = mesh
        .add_elements(
            &[0],
            &[ElementType::Tetrahedron],
            &[0, 1, 2, 3],
            ElementFields::default(),
        )
        .unwrap_err();
    assert!(matches!(err, MeshError::TopologyMismatch { .. }));
}

#[test]
fn dangling_reference_leaves_nothing_queryable() {
    let mut mesh = Mesh::new(2, 2).unwrap();
    mesh.add_nodes(&[0, 1, 2], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0; 3])
        .unwrap();
    let err = mesh
        .add_elements(
            &[0, 1],
            &[ElementType::Triangle; 2],
            &[0, 1, 2, 0, 2, 42],
            ElementFields::default().with_area(vec![0.5, 0.5]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        MeshError::DanglingReference {
            element: 1,
            node: 42
        }
    );
    assert_eq!(mesh.phase(), BuildPhase::NodesAdded);
    assert_eq!(mesh.element_count().unwrap(), 0);
    assert!(mesh.get_coords(0, MeshLocation::Node).is_err());
    assert!(mesh.elements().is_err());
}

#[test]
fn mixed_polygons_carry_their_own_arity() {
    let mut mesh = Mesh::new(2, 2).unwrap();
    mesh.add_nodes(
        &[1, 2, 3, 4, 5],
        &[0.0, 0.0, 1.0, 0.0, 2.0, 0.5, 1.0, 1.0, 0.0, 1.0],
        &[0; 5],
    )
    .unwrap();
    mesh.add_elements(
        &[10],
        &[ElementType::Polygon(5)],
        &[1, 2, 3, 4, 5],
        ElementFields::default().with_mask(vec![1]),
    )
    .unwrap();
    let elements = mesh.elements().unwrap();
    assert_eq!(elements.element_connectivity(0), Some(&[1, 2, 3, 4, 5][..]));
    assert_eq!(mesh.mask(MeshLocation::Element).unwrap(), Some(&[1][..]));
}

#[test]
fn degenerate_polygons_are_rejected() {
    let mut mesh = Mesh::new(2, 2).unwrap();
    mesh.add_nodes(&[0, 1, 2], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0; 3])
        .unwrap();
    let err = mesh
        .add_elements(
            &[0, 1],
            &[ElementType::Polygon(0), ElementType::Polygon(3)],
            &[0, 1, 2],
            ElementFields::default(),
        )
        .unwrap_err();
    assert!(matches!(err, MeshError::TopologyMismatch { element: 0, .. }));
    let err = mesh
        .add_elements(
            &[1],
            &[ElementType::Polygon(3)],
            &[0, 1, 2],
            ElementFields::default(),
        )
        .unwrap_err();
    assert!(matches!(err, MeshError::TopologyMismatch { element: 1, .. }));
    assert!(mesh.elements().is_err());
}

#[test]
fn repeated_node_ids_are_rejected() {
    let mut mesh = Mesh::new(2, 2).unwrap();
    let err = mesh
        .add_nodes(&[4, 5, 4], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0; 3])
        .unwrap_err();
    assert_eq!(
        err,
        MeshError::DuplicateId {
            location: MeshLocation::Node,
            id: 4
        }
    );
    // the failed call leaves the mesh ready for a corrected one
    mesh.add_nodes(&[4, 5, 6], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0; 3])
        .unwrap();
}

#[test]
fn destroy_is_idempotent_and_blocks_access() {
    let mut mesh = unit_square();
    mesh.destroy();
    mesh.destroy();
    assert!(mesh.is_finalized());
    assert_eq!(
        mesh.get_coords(0, MeshLocation::Node).unwrap_err(),
        MeshError::UseAfterFree
    );
    assert_eq!(mesh.node_count().unwrap_err(), MeshError::UseAfterFree);
    assert_eq!(
        mesh.add_nodes(&[0], &[0.0, 0.0], &[0]).unwrap_err(),
        MeshError::UseAfterFree
    );
    assert!(matches!(mesh.view(), Err(MeshError::UseAfterFree)));
}

#[test]
fn ghost_nodes_follow_the_owner_tags() {
    let comm = std::sync::Arc::new(LocalComm::new(0, 2).unwrap());
    let mut mesh = Mesh::with_communicator(2, 2, comm).unwrap();
    mesh.add_nodes(&[0, 1, 2], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0, 0, 1])
        .unwrap();
    mesh.add_elements(&[0], &[ElementType::Triangle], &[0, 1, 2], ElementFields::default())
        .unwrap();
    assert_eq!(mesh.size(MeshLocation::Node).unwrap(), 3);
    assert_eq!(mesh.size_owned(MeshLocation::Node).unwrap(), 2);
    let nodes = mesh.nodes().unwrap();
    assert_eq!(nodes.ownership().ghost_indices(0).collect::<Vec<_>>(), vec![2]);
}

proptest! {
    #[test]
    fn fresh_mesh_has_no_entities(p in 1usize..=3, extra in 0usize..=2) {
        let s = (p + extra).min(3);
        let mesh = Mesh::new(p, s).unwrap();
        prop_assert_eq!(mesh.node_count().unwrap(), 0);
        prop_assert_eq!(mesh.element_count().unwrap(), 0);
        prop_assert_eq!(mesh.phase(), BuildPhase::Empty);
    }

    #[test]
    fn elements_before_nodes_always_fail(
        ids in prop::collection::vec(any::<i64>(), 1..8),
    ) {
        let mut mesh = Mesh::new(2, 2).unwrap();
        let types = vec![ElementType::Triangle; ids.len()];
        let conn: Vec<i64> = ids.iter().flat_map(|&id| [id, id, id]).collect();
        let err = mesh
            .add_elements(&ids, &types, &conn, ElementFields::default())
            .unwrap_err();
        prop_assert!(matches!(err, MeshError::InvalidState(_)));
    }

    #[test]
    fn node_coordinates_read_back_bit_identical(
        coords in prop::collection::vec(-1.0e6f64..1.0e6, 9..30),
    ) {
        let n = coords.len() / 3;
        let coords = &coords[..3 * n];
        let ids: Vec<i64> = (0..n as i64).collect();
        let mut mesh = Mesh::new(2, 3).unwrap();
        mesh.add_nodes(&ids, coords, &vec![0; n]).unwrap();
        mesh.add_elements(&[0], &[ElementType::Triangle], &[0, 1, 2], ElementFields::default())
            .unwrap();
        for dim in 0..3 {
            let got = mesh.get_coords(dim, MeshLocation::Node).unwrap();
            prop_assert_eq!(got.len(), n);
            for (i, v) in got.iter().enumerate() {
                prop_assert_eq!(v.to_bits(), coords[3 * i + dim].to_bits());
            }
        }
    }
}
