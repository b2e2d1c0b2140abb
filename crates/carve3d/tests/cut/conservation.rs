//! Volume-conservation sweeps and determinism checks.

use super::util::{integrated_volume, node_ids, unit_cube_session};
use approx::assert_relative_eq;
use carve3d::na::{Point3, Vector3};
use carve3d::{CellType, CutResult, CutSession, IntegrationStrategy};

fn plane_cut_session(normal: Vector3<f64>, strategy: IntegrationStrategy) -> CutSession {
    let mut session = unit_cube_session(strategy);

    let n = normal.normalize();
    let center = Point3::new(0.5, 0.5, 0.5);

    // An orthonormal in-plane basis, large enough to span past the cube.
    let tangent = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::new(0.0, -n.z, n.y)
    } else if n.y.abs() <= n.z.abs() {
        Vector3::new(-n.z, 0.0, n.x)
    } else {
        Vector3::new(-n.y, n.x, 0.0)
    };
    let u = tangent.normalize() * 2.0;
    let v = n.cross(&tangent).normalize() * 2.0;

    let corners = [
        center - u - v,
        center + u - v,
        center + u + v,
        center - u + v,
    ];
    session
        .add_cut_side(1, &node_ids(4), &corners, CellType::Quad4)
        .unwrap();
    session
}

fn sorted_cell_volumes(result: &CutResult) -> Vec<f64> {
    let mut volumes: Vec<f64> = result
        .element(1)
        .unwrap()
        .volume_cells()
        .map(|c| c.volume())
        .collect();
    volumes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    volumes
}

/// Random planes through the cube center: both strategies must reproduce the
/// element volume, and they must agree on the cell volumes.
#[test]
fn random_plane_cuts_conserve_volume() {
    let mut rng = oorandom::Rand64::new(4102);

    for _ in 0..20 {
        let normal = Vector3::new(
            rng.rand_float() * 2.0 - 1.0,
            rng.rand_float() * 2.0 - 1.0,
            rng.rand_float() * 2.0 - 1.0,
        );
        if normal.norm() < 1.0e-2 {
            continue;
        }

        let tess = plane_cut_session(normal, IntegrationStrategy::Tessellation)
            .cut()
            .unwrap();
        let dd = plane_cut_session(normal, IntegrationStrategy::DirectDivergence)
            .cut()
            .unwrap();

        for result in [&tess, &dd] {
            let element = result.element(1).unwrap();
            assert_eq!(element.cell_count(), 2);
            assert_relative_eq!(element.total_volume(), 1.0, epsilon = 1.0e-10);
            assert_relative_eq!(integrated_volume(element), 1.0, epsilon = 1.0e-10);
        }

        // Tessellation and direct divergence agree on the decomposition.
        let v1 = sorted_cell_volumes(&tess);
        let v2 = sorted_cell_volumes(&dd);
        for (a, b) in v1.iter().zip(v2.iter()) {
            assert_relative_eq!(a, b, epsilon = 1.0e-10);
        }
    }
}

/// Identical input produces identical output, down to every integration
/// point: the engine assigns point identities deterministically.
#[test]
fn repeated_cuts_are_identical() {
    let session = plane_cut_session(
        Vector3::new(0.3, -0.7, 0.64),
        IntegrationStrategy::Tessellation,
    );

    let first = session.cut().unwrap();
    let second = session.cut().unwrap();

    let cells1: Vec<_> = first.element(1).unwrap().volume_cells().collect();
    let cells2: Vec<_> = second.element(1).unwrap().volume_cells().collect();
    assert_eq!(cells1.len(), cells2.len());

    for (c1, c2) in cells1.iter().zip(cells2.iter()) {
        assert_eq!(c1.position(), c2.position());
        assert_eq!(c1.volume(), c2.volume());

        let p1: Vec<_> = c1.integration_points().collect();
        let p2: Vec<_> = c2.integration_points().collect();
        assert_eq!(p1.len(), p2.len());
        for (a, b) in p1.iter().zip(p2.iter()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.weight, b.weight);
        }
    }
}
