use carve3d::na::Point3;
use carve3d::{CellType, CutOptions, CutSession, ElementResult, IntegrationStrategy};

/// The unit cube in the node ordering used throughout the mesh-cut tests
/// (top face first, as in the reference configurations these tests mirror).
pub fn unit_cube_nodes() -> Vec<Point3<f64>> {
    vec![
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]
}

/// An axis-aligned cube `[lo, hi]³` in the standard hex8 node ordering
/// (bottom face counterclockwise, then top face).
pub fn cube_nodes(lo: f64, hi: f64) -> Vec<Point3<f64>> {
    vec![
        Point3::new(lo, lo, lo),
        Point3::new(hi, lo, lo),
        Point3::new(hi, hi, lo),
        Point3::new(lo, hi, lo),
        Point3::new(lo, lo, hi),
        Point3::new(hi, lo, hi),
        Point3::new(hi, hi, hi),
        Point3::new(lo, hi, hi),
    ]
}

pub fn node_ids(n: usize) -> Vec<u32> {
    (0..n as u32).collect()
}

/// Builds a session holding one unit-cube hex8 element (mesh-cut ordering).
pub fn unit_cube_session(strategy: IntegrationStrategy) -> CutSession {
    let mut session = CutSession::new(CutOptions {
        integration_strategy: strategy,
        ..CutOptions::default()
    });
    let nodes = unit_cube_nodes();
    session
        .add_element(1, &node_ids(8), &nodes, CellType::Hex8)
        .unwrap();
    session
}

/// Sum of all integration weights of all cells of an element.
pub fn integrated_volume(element: &ElementResult) -> f64 {
    element
        .volume_cells()
        .flat_map(|c| c.integration_points())
        .map(|p| p.weight)
        .sum()
}
