//! Integration points and quadrature rules.
//!
//! Volume integration uses a degree-2, 4-point rule on each tetrahedral
//! sub-cell; surface integration uses a degree-2, 3-point rule per facet
//! triangle; the direct-divergence path additionally uses a 5-point
//! Gauss–Legendre rule along its internal lines.

use crate::math::{Point, Real, Vector};
use crate::tessellation::oriented_tet_volume;

/// A volume integration point.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationPoint {
    /// Global position.
    pub position: Point<Real>,
    /// Weight in volume measure (weights of a cell sum to the cell volume).
    pub weight: Real,
}

/// A surface integration point on a cut-side facet.
#[derive(Copy, Clone, Debug)]
pub struct BoundaryIntegrationPoint {
    /// Global position.
    pub position: Point<Real>,
    /// Weight in area measure.
    pub weight: Real,
    /// Unit normal pointing outward from the adjacent volume cell.
    pub normal: Vector<Real>,
    /// The external id of the cut side this point integrates.
    pub side_id: u32,
}

/// Barycentric coordinates of the degree-2 tet rule.
const TET4_POS: [[Real; 4]; 4] = [
    [
        0.585_410_196_624_968_5,
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
    ],
    [
        0.138_196_601_125_010_5,
        0.585_410_196_624_968_5,
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
    ],
    [
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
        0.585_410_196_624_968_5,
        0.138_196_601_125_010_5,
    ],
    [
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
        0.138_196_601_125_010_5,
        0.585_410_196_624_968_5,
    ],
];

/// The degree-2, 4-point Gauss rule of the tetrahedron `(a, b, c, d)`.
///
/// The weights sum to the absolute tet volume.
pub fn tet_gauss_points(
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    d: &Point<Real>,
) -> [IntegrationPoint; 4] {
    let vol = oriented_tet_volume(a, b, c, d).abs();
    TET4_POS.map(|bary| IntegrationPoint {
        position: Point::from(
            a.coords * bary[0] + b.coords * bary[1] + c.coords * bary[2] + d.coords * bary[3],
        ),
        weight: vol * 0.25,
    })
}

/// Barycentric coordinates of the degree-2 triangle rule.
const TRI3_POS: [[Real; 3]; 3] = [
    [2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0],
    [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
    [1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0],
];

/// The degree-2, 3-point Gauss rule of the triangle `(a, b, c)`.
///
/// The weights sum to the triangle area.
pub fn triangle_gauss_points(
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
) -> [IntegrationPoint; 3] {
    let area = (b - a).cross(&(c - a)).norm() * 0.5;
    TRI3_POS.map(|bary| IntegrationPoint {
        position: Point::from(a.coords * bary[0] + b.coords * bary[1] + c.coords * bary[2]),
        weight: area / 3.0,
    })
}

/// Abscissae and weights of the 5-point Gauss–Legendre rule on `[-1, 1]`.
pub const GAUSS_LEGENDRE_5: [(Real, Real); 5] = [
    (-0.906_179_845_938_664, 0.236_926_885_056_189_1),
    (-0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.0, 0.568_888_888_888_888_9),
    (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.906_179_845_938_664, 0.236_926_885_056_189_1),
];

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;

    #[test]
    fn tet_rule_integrates_quadratics() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.0, 1.0, 0.0);
        let d = Point::new(0.0, 0.0, 1.0);

        let pts = tet_gauss_points(&a, &b, &c, &d);
        let total: Real = pts.iter().map(|p| p.weight).sum();
        assert_relative_eq!(total, 1.0 / 6.0, epsilon = 1.0e-14);

        // ∫ x² over the unit tet = 1/60.
        let quad: Real = pts
            .iter()
            .map(|p| p.weight * p.position.x * p.position.x)
            .sum();
        assert_relative_eq!(quad, 1.0 / 60.0, epsilon = 1.0e-14);
    }

    #[test]
    fn triangle_rule_integrates_quadratics() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.0, 1.0, 0.0);

        let pts = triangle_gauss_points(&a, &b, &c);
        let total: Real = pts.iter().map(|p| p.weight).sum();
        assert_relative_eq!(total, 0.5, epsilon = 1.0e-14);

        // ∫ x y over the unit triangle = 1/24.
        let xy: Real = pts
            .iter()
            .map(|p| p.weight * p.position.x * p.position.y)
            .sum();
        assert_relative_eq!(xy, 1.0 / 24.0, epsilon = 1.0e-14);
    }

    #[test]
    fn gauss_legendre_5_integrates_degree_9() {
        // ∫₋₁¹ x⁸ dx = 2/9.
        let val: Real = GAUSS_LEGENDRE_5
            .iter()
            .map(|(x, w)| w * x.powi(8))
            .sum();
        assert_relative_eq!(val, 2.0 / 9.0, epsilon = 1.0e-12);
    }
}
