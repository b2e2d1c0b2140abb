//! Direct-divergence integration.
//!
//! Skips tetrahedralization entirely: a volume integral over a cell is
//! rewritten with the divergence theorem as a sum of facet surface integrals,
//!
//! ```text
//! ∫_V f dV = ∮_S n_x · ( ∫_{x0}^{x} f(t, y, z) dt ) dS
//! ```
//!
//! Every facet surface Gauss point spawns a 1-D Gauss–Legendre line of
//! internal points between the reference plane `x = x0` and the surface
//! point; the emitted `(position, weight)` pairs integrate any smooth
//! integrand over the cell. Weights are signed: facets facing backwards along
//! `x` contribute negatively, and the weights of a cell sum to its volume.

use crate::cells::closed_boundary_tris;
use crate::integration::{triangle_gauss_points, IntegrationPoint, GAUSS_LEGENDRE_5};
use crate::math::{Point, Real};
use crate::topology::{CellId, CutMesh};

/// Generates the direct-divergence integration points of one volume cell.
///
/// `reference_x` is the x-coordinate of the reference plane; any value works,
/// but a plane close to the element keeps the internal lines short. The
/// weights sum to the cell volume.
pub fn divergence_points(
    mesh: &CutMesh,
    cell: CellId,
    reference_x: Real,
) -> Vec<IntegrationPoint> {
    let boundary = closed_boundary_tris(mesh, cell);
    let mut out = Vec::new();

    for (tri, _) in boundary {
        let [a, b, c] = tri.map(|p| mesh.point(p));
        let area_vec = (b - a).cross(&(c - a)) * 0.5;
        let area = area_vec.norm();
        if area == 0.0 {
            continue;
        }
        let nx = area_vec.x / area;
        if nx.abs() < 1.0e-14 {
            // The facet is parallel to the x-axis: no x-flux through it.
            continue;
        }

        for surface in triangle_gauss_points(&a, &b, &c) {
            let span = surface.position.x - reference_x;
            for (xi, w) in GAUSS_LEGENDRE_5 {
                let x = reference_x + span * (xi + 1.0) * 0.5;
                out.push(IntegrationPoint {
                    position: Point::new(x, surface.position.y, surface.position.z),
                    weight: surface.weight * nx * span * w * 0.5,
                });
            }
        }
    }

    log::trace!(
        "direct divergence: {} integration points for cell {:?}",
        out.len(),
        cell
    );

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cells::find_volume_cells;
    use crate::facets::{build_facets, ElementShell};
    use crate::intersect::{IntersectionSet, Tolerances};
    use crate::math::Point;
    use crate::topology::{CutMesh, SideKind};

    #[test]
    fn divergence_recovers_cube_volume_and_moments() {
        let mut mesh = CutMesh::new(1.0e-10);
        let corners = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let ids: Vec<_> = corners
            .iter()
            .map(|c| mesh.insert_point(Point::new(c[0], c[1], c[2])))
            .collect();

        let faces = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [1, 2, 6, 5],
            [0, 4, 7, 3],
        ];

        let mut shell = ElementShell {
            planes: Vec::new(),
            sides: Vec::new(),
        };
        for (fi, face) in faces.iter().enumerate() {
            let loop_pts: Vec<_> = face.iter().map(|i| ids[*i]).collect();
            let side = mesh
                .add_side(SideKind::Element { face: fi }, loop_pts)
                .unwrap();
            shell.sides.push(side);
            shell.planes.push(mesh.side(side).plane);
        }

        let tol = Tolerances {
            point: 1.0e-10,
            param: 1.0e-10,
        };
        build_facets(&mut mesh, &shell, &[], &IntersectionSet::default(), &tol, false).unwrap();
        let cells = find_volume_cells(&mut mesh, &tol).unwrap();
        assert_eq!(cells.len(), 1);

        let pts = divergence_points(&mesh, cells[0], -0.5);

        let volume: f64 = pts.iter().map(|p| p.weight).sum();
        assert_relative_eq!(volume, 1.0, epsilon = 1.0e-10);

        // ∫ x y z over the unit cube = 1/8.
        let moment: f64 = pts
            .iter()
            .map(|p| p.weight * p.position.x * p.position.y * p.position.z)
            .sum();
        assert_relative_eq!(moment, 0.125, epsilon = 1.0e-10);
    }
}
