use crate::math::{Point, Real};

/// Signed volume of the tetrahedron `(a, b, c, d)`.
///
/// Positive when `d` is on the side the right-handed normal of `(a, b, c)`
/// points away from, i.e. when `(a, b, c)` is seen counterclockwise from
/// outside the tet.
pub fn oriented_tet_volume(a: &Point<Real>, b: &Point<Real>, c: &Point<Real>, d: &Point<Real>) -> Real {
    (b - a).cross(&(c - a)).dot(&(d - a)) / -6.0
}

/// Scale-invariant flatness measure of a tet: `1` for the regular tet,
/// approaching `0` for slivers.
pub fn tet_flatness(a: &Point<Real>, b: &Point<Real>, c: &Point<Real>, d: &Point<Real>) -> Real {
    let vol = oriented_tet_volume(a, b, c, d).abs();
    let lmax = [
        (b - a).norm(),
        (c - a).norm(),
        (d - a).norm(),
        (c - b).norm(),
        (d - b).norm(),
        (d - c).norm(),
    ]
    .into_iter()
    .fold(0.0, Real::max);

    if lmax == 0.0 {
        return 0.0;
    }
    // The regular tet of edge L has volume L³/(6√2).
    vol * 6.0 * std::f64::consts::SQRT_2 / lmax.powi(3)
}

/// Barycentric point-in-tet test with an absolute tolerance on the four
/// sub-volumes.
pub fn point_in_tet(
    p: &Point<Real>,
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    d: &Point<Real>,
    eps: Real,
) -> bool {
    let total = oriented_tet_volume(a, b, c, d);
    if total == 0.0 {
        return false;
    }
    let sign = total.signum();

    sign * oriented_tet_volume(p, b, c, d) >= -eps
        && sign * oriented_tet_volume(a, p, c, d) >= -eps
        && sign * oriented_tet_volume(a, b, p, d) >= -eps
        && sign * oriented_tet_volume(a, b, c, p) >= -eps
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;

    fn unit_tet() -> [Point<Real>; 4] {
        [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn unit_tet_volume() {
        let [a, b, c, d] = unit_tet();
        // (a, b, c) counterclockwise seen from below: positive with d above.
        assert_relative_eq!(oriented_tet_volume(&a, &c, &b, &d), 1.0 / 6.0);
        assert_relative_eq!(oriented_tet_volume(&a, &b, &c, &d), -1.0 / 6.0);
    }

    #[test]
    fn flatness_of_sliver_vanishes() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.0, 1.0, 0.0);
        let d = Point::new(0.5, 0.5, 1.0e-9);
        assert!(tet_flatness(&a, &b, &c, &d) < 1.0e-8);
    }

    #[test]
    fn containment() {
        let [a, b, c, d] = unit_tet();
        assert!(point_in_tet(
            &Point::new(0.1, 0.1, 0.1),
            &a,
            &b,
            &c,
            &d,
            1.0e-14
        ));
        assert!(!point_in_tet(
            &Point::new(1.0, 1.0, 1.0),
            &a,
            &b,
            &c,
            &d,
            1.0e-14
        ));
    }
}
