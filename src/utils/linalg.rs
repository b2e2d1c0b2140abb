//! The dense linear-algebra façade used by the cut kernels.
//!
//! The cutting engine only ever needs small dense solves: 3×3 systems for
//! plane/line intersections and local-coordinate recovery, 4×4 systems for
//! tetrahedral barycentric coordinates. Everything is delegated to nalgebra.

use crate::math::{Matrix3, Matrix4, Real, Vector3};
use na::Vector4;

/// Solves the 3×3 linear system `m * x = b`.
///
/// Returns `None` if `m` is singular.
pub fn solve3(m: &Matrix3<Real>, b: &Vector3<Real>) -> Option<Vector3<Real>> {
    m.lu().solve(b)
}

/// Solves the 4×4 linear system `m * x = b`.
///
/// Returns `None` if `m` is singular.
pub fn solve4(m: &Matrix4<Real>, b: &Vector4<Real>) -> Option<Vector4<Real>> {
    m.lu().solve(b)
}
