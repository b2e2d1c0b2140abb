//! End-to-end mesh cuts of a hex8 element against explicit cut sides.

use super::util::{integrated_volume, node_ids, unit_cube_session};
use approx::assert_relative_eq;
use carve3d::na::Point3;
use carve3d::{CellType, IntegrationStrategy, Position};

/// Two triangles forming a bent wall through the unit cube.
#[test]
fn hex8_twin_triangle() {
    let mut session = unit_cube_session(IntegrationStrategy::DirectDivergence);

    session
        .add_cut_side(
            1,
            &[11, 12, 13],
            &[
                Point3::new(0.5, 0.0, 1.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.25, 1.0, 1.0),
            ],
            CellType::Tri3,
        )
        .unwrap();
    session
        .add_cut_side(
            2,
            &[11, 14, 12],
            &[
                Point3::new(0.5, 0.0, 1.0),
                Point3::new(0.4, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
            CellType::Tri3,
        )
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert!(element.cell_count() >= 2);
    assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);

    // The wall separates an inside from an outside part.
    let positions: Vec<Position> = element.volume_cells().map(|c| c.position()).collect();
    assert!(positions.contains(&Position::Inside));
    assert!(positions.contains(&Position::Outside));

    // Every cell adjacent to the wall carries boundary points tagged with the
    // originating side ids.
    let mut side_ids: Vec<u32> = element
        .volume_cells()
        .flat_map(|c| c.boundary_points())
        .map(|b| b.side_id)
        .collect();
    side_ids.sort_unstable();
    side_ids.dedup();
    assert_eq!(side_ids, vec![1, 2]);
}

/// Two quads forming an L-shaped wall: an inner block plus the L-shaped rest.
#[test]
fn hex8_twin_quad() {
    let mut session = unit_cube_session(IntegrationStrategy::Tessellation);

    session
        .add_cut_side(
            1,
            &[11, 12, 13, 14],
            &[
                Point3::new(0.1, 0.02, 0.0),
                Point3::new(1.0, 0.02, 0.0),
                Point3::new(1.0, 0.02, 1.0),
                Point3::new(0.1, 0.02, 1.0),
            ],
            CellType::Quad4,
        )
        .unwrap();
    session
        .add_cut_side(
            2,
            &[11, 14, 15, 16],
            &[
                Point3::new(0.1, 0.02, 0.0),
                Point3::new(0.1, 0.02, 1.0),
                Point3::new(0.1, 1.0, 1.0),
                Point3::new(0.1, 1.0, 0.0),
            ],
            CellType::Quad4,
        )
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert!(element.cell_count() >= 2);
    assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);

    // The inner block behind both walls is one of the cells.
    let inner = 0.9 * 0.98;
    assert!(
        element
            .volume_cells()
            .any(|c| (c.volume() - inner).abs() <= 1.0e-10),
        "expected a cell of volume {}",
        inner
    );
}

/// Four quads forming two independent bent walls ("chair" configuration).
#[test]
fn hex8_chair_cut() {
    let mut session = unit_cube_session(IntegrationStrategy::DirectDivergence);

    let quads: [[[f64; 3]; 4]; 4] = [
        [
            [0.01, 0.0, 0.0],
            [0.02, 0.45, 0.0],
            [0.02, 0.45, 1.0],
            [0.01, 0.0, 1.0],
        ],
        [
            [0.02, 0.45, 0.0],
            [1.0, 0.45, 0.0],
            [1.0, 0.45, 1.0],
            [0.02, 0.45, 1.0],
        ],
        [
            [0.0, 0.55, 0.0],
            [0.0, 0.55, 1.0],
            [0.8, 0.55, 1.0],
            [0.8, 0.55, 0.0],
        ],
        [
            [0.95, 1.0, 0.0],
            [0.8, 0.55, 0.0],
            [0.8, 0.55, 1.0],
            [0.95, 1.0, 1.0],
        ],
    ];

    for (i, quad) in quads.iter().enumerate() {
        let corners: Vec<Point3<f64>> = quad
            .iter()
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        session
            .add_cut_side(i as u32 + 1, &node_ids(4), &corners, CellType::Quad4)
            .unwrap();
    }

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    // Two separating walls: at least three regions.
    assert!(element.cell_count() >= 3);
    assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);
}

/// Two quads meeting along a shared edge running through the cube interior.
#[test]
fn hex8_v_cut() {
    let mut session = unit_cube_session(IntegrationStrategy::Tessellation);

    session
        .add_cut_side(
            1,
            &[11, 12, 13, 14],
            &[
                Point3::new(0.5, 0.5, -0.2),
                Point3::new(0.5, 0.5, 1.2),
                Point3::new(-0.5, 1.5, 1.2),
                Point3::new(-0.5, 1.5, -0.2),
            ],
            CellType::Quad4,
        )
        .unwrap();
    session
        .add_cut_side(
            2,
            &[16, 15, 12, 11],
            &[
                Point3::new(0.9, 1.5, -0.2),
                Point3::new(0.9, 1.5, 1.2),
                Point3::new(0.5, 0.5, 1.2),
                Point3::new(0.5, 0.5, -0.2),
            ],
            CellType::Quad4,
        )
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert_eq!(element.cell_count(), 2);
    assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);
}
