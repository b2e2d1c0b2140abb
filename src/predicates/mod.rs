//! Exact geometric predicates.
//!
//! Sign computations run a floating-point filter first: the determinant is
//! evaluated in plain `f64` together with an a-priori error bound derived from
//! the permanent of the same expression. Whenever the bound cannot certify the
//! sign, the adaptively exact predicates of the `robust` crate decide. The
//! exact branch always returns a definite answer, so these functions never
//! fail; tolerance-aware *classification* (cut vs. touch) happens downstream,
//! on top of the exact signs.

pub use self::plane::Plane;

mod plane;

use crate::math::{Point, Point2, Real};

/// The sign of an orientation determinant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Strictly positive determinant.
    Positive,
    /// Strictly negative determinant.
    Negative,
    /// Exactly zero: the points are affinely dependent.
    Degenerate,
}

impl Orientation {
    /// Converts a scalar sign into an orientation.
    fn from_sign(value: Real) -> Self {
        if value > 0.0 {
            Orientation::Positive
        } else if value < 0.0 {
            Orientation::Negative
        } else {
            Orientation::Degenerate
        }
    }

    /// The opposite orientation. Degenerate stays degenerate.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Positive => Orientation::Negative,
            Orientation::Negative => Orientation::Positive,
            Orientation::Degenerate => Orientation::Degenerate,
        }
    }
}

/// Relative rounding-error factor of the 3×3 determinant filter.
///
/// A conservative multiple of the bound from Shewchuk's "Adaptive Precision
/// Floating-Point Arithmetic and Fast Robust Geometric Predicates".
const ORIENT3D_FILTER: Real = 1.0e-14;

/// Relative rounding-error factor of the 2×2 determinant filter.
const ORIENT2D_FILTER: Real = 1.0e-14;

/// Orientation of `d` relative to the plane through `a`, `b`, `c`.
///
/// Positive when `d` lies below the plane, with `a`, `b`, `c` appearing in
/// counterclockwise order when seen from above.
pub fn orient3d(a: &Point<Real>, b: &Point<Real>, c: &Point<Real>, d: &Point<Real>) -> Orientation {
    let ad = a - d;
    let bd = b - d;
    let cd = c - d;

    let det = ad.dot(&bd.cross(&cd));

    // Permanent of the expression: same structure with every product taken in
    // absolute value. Bounds the rounding error of `det`.
    let perm = det3_permanent(&ad, &bd, &cd);

    if det.abs() > ORIENT3D_FILTER * perm {
        return Orientation::from_sign(det);
    }

    let exact = robust::orient3d(
        robust::Coord3D { x: a.x, y: a.y, z: a.z },
        robust::Coord3D { x: b.x, y: b.y, z: b.z },
        robust::Coord3D { x: c.x, y: c.y, z: c.z },
        robust::Coord3D { x: d.x, y: d.y, z: d.z },
    );
    Orientation::from_sign(exact)
}

/// Orientation of the 2D triangle `a`, `b`, `c`.
///
/// Positive when the triangle winds counterclockwise.
pub fn orient2d(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>) -> Orientation {
    let acx = a.x - c.x;
    let acy = a.y - c.y;
    let bcx = b.x - c.x;
    let bcy = b.y - c.y;

    let det = acx * bcy - acy * bcx;
    let perm = acx.abs() * bcy.abs() + acy.abs() * bcx.abs();

    if det.abs() > ORIENT2D_FILTER * perm {
        return Orientation::from_sign(det);
    }

    let exact = robust::orient2d(
        robust::Coord { x: a.x, y: a.y },
        robust::Coord { x: b.x, y: b.y },
        robust::Coord { x: c.x, y: c.y },
    );
    Orientation::from_sign(exact)
}

// The 3×3 determinant with every product taken positively.
fn det3_permanent(u: &na::Vector3<Real>, v: &na::Vector3<Real>, w: &na::Vector3<Real>) -> Real {
    let (vx, vy, vz) = (v.x.abs(), v.y.abs(), v.z.abs());
    let (wx, wy, wz) = (w.x.abs(), w.y.abs(), w.z.abs());

    u.x.abs() * (vy * wz + vz * wy) + u.y.abs() * (vz * wx + vx * wz) + u.z.abs() * (vx * wy + vy * wx)
}
