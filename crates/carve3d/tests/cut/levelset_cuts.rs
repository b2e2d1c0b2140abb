//! End-to-end level-set cuts: the cut surface is the zero isocontour of a
//! nodal field.

use super::util::{cube_nodes, integrated_volume, node_ids};
use approx::assert_relative_eq;
use carve3d::{CellType, CutOptions, CutSession, Position};

/// Nodal values `[-1, -1, -1, -1, 1, 1, 1, 1]` on the unit cube: the cut
/// facet is the midplane `z = 0.5`.
#[test]
fn hex8_level_set_midplane() {
    let mut session = CutSession::new(CutOptions::default());
    let nodes = cube_nodes(0.0, 1.0);
    let values = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
    session
        .add_level_set_element(1, &node_ids(8), &nodes, &values, CellType::Hex8)
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert_eq!(element.cell_count(), 2);
    assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);

    // Node tags follow the nodal signs.
    let tags = element.node_positions();
    assert!(tags[..4].iter().all(|t| *t == Position::Inside));
    assert!(tags[4..].iter().all(|t| *t == Position::Outside));

    for cell in element.volume_cells() {
        assert_relative_eq!(cell.volume(), 0.5, epsilon = 1.0e-10);

        // Cell side and integration points agree with the classification.
        let above = cell.position() == Position::Outside;
        for p in cell.integration_points() {
            assert_eq!(p.position.z > 0.5, above);
        }

        // The cut facet is the midplane; outward normals point away from the
        // cell, and the facet area is the full unit square.
        let mut area = 0.0;
        for b in cell.boundary_points() {
            assert_relative_eq!(b.position.z, 0.5, epsilon = 1.0e-12);
            assert_relative_eq!(b.normal.z, if above { -1.0 } else { 1.0 }, epsilon = 1.0e-12);
            assert_eq!(b.side_id, u32::MAX);
            area += b.weight;
        }
        assert_relative_eq!(area, 1.0, epsilon = 1.0e-10);
    }
}

/// Near-degenerate nodal values: a sliver of positive field in the corner of
/// a `[-1, 1]³` element. The positive region of the (here: planar) interpolant
/// is a prism of volume `4e-6`.
#[test]
fn hex8_level_set_near_degenerate() {
    let mut session = CutSession::new(CutOptions::default());
    let nodes = cube_nodes(-1.0, 1.0);
    let values = [
        -0.1999, -0.1999, -0.0999, -0.0999, -0.0999, -0.0999, 0.0001, 0.0001,
    ];
    session
        .add_level_set_element(1, &node_ids(8), &nodes, &values, CellType::Hex8)
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert_eq!(element.cell_count(), 2);
    assert_relative_eq!(element.total_volume(), 8.0, epsilon = 1.0e-9);
    assert_relative_eq!(integrated_volume(element), 8.0, epsilon = 1.0e-9);

    // The interpolant reduces to -0.0999 + 0.05 (y + z): positive only for
    // y + z > 1.998, a triangular prism of volume (0.002²/2) · 2.
    let tiny = element
        .volume_cells()
        .find(|c| c.position() == Position::Outside)
        .expect("the positive sliver must be classified outside");
    assert!((tiny.volume() - 4.0e-6).abs() <= 1.0e-10 * 8.0);

    let big = element
        .volume_cells()
        .find(|c| c.position() == Position::Inside)
        .unwrap();
    assert!((big.volume() - (8.0 - 4.0e-6)).abs() <= 1.0e-10 * 8.0);
}

/// A level-set field without sign change leaves the element uncut.
#[test]
fn hex8_level_set_uncut() {
    let mut session = CutSession::new(CutOptions::default());
    let nodes = cube_nodes(-1.0, 1.0);
    let values = [-1.0, -2.0, -1.5, -1.0, -0.5, -1.0, -2.5, -3.0];
    session
        .add_level_set_element(1, &node_ids(8), &nodes, &values, CellType::Hex8)
        .unwrap();

    let result = session.cut().unwrap();
    let element = result.element(1).unwrap();

    assert_eq!(element.cell_count(), 1);
    let cell = element.volume_cells().next().unwrap();
    assert_eq!(cell.position(), Position::Inside);
    assert_relative_eq!(cell.volume(), 8.0, epsilon = 1.0e-10);
    assert_relative_eq!(integrated_volume(element), 8.0, epsilon = 1.0e-10);
    assert_eq!(cell.boundary_points().count(), 0);
}
