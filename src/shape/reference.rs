//! Reference-cell shape functions of the linear volume shapes.
//!
//! Only the linearized shapes are evaluated here; quadratic elements are cut
//! through their corner nodes. The functions are used for level-set
//! interpolation and for recovering local coordinates of physical points.

use crate::math::{Matrix3, Point, Real, Vector};
use crate::shape::CellType;
use crate::utils::solve3;
use arrayvec::ArrayVec;

/// Shape function values of the linearized `shape` at local coordinates `xi`.
pub fn shape_values(shape: CellType, xi: &Vector<Real>) -> ArrayVec<Real, 8> {
    let mut out = ArrayVec::new();
    let (r, s, t) = (xi.x, xi.y, xi.z);

    match shape.linearized() {
        CellType::Tet4 => {
            out.push(1.0 - r - s - t);
            out.push(r);
            out.push(s);
            out.push(t);
        }
        CellType::Hex8 => {
            for (cr, cs, ct) in HEX8_SIGNS {
                out.push((1.0 + cr * r) * (1.0 + cs * s) * (1.0 + ct * t) * 0.125);
            }
        }
        CellType::Wedge6 => {
            let u = 1.0 - r - s;
            out.push(u * (1.0 - t) * 0.5);
            out.push(r * (1.0 - t) * 0.5);
            out.push(s * (1.0 - t) * 0.5);
            out.push(u * (1.0 + t) * 0.5);
            out.push(r * (1.0 + t) * 0.5);
            out.push(s * (1.0 + t) * 0.5);
        }
        CellType::Pyramid5 => {
            out.push((1.0 - r) * (1.0 - s) * (1.0 - t) * 0.25);
            out.push((1.0 + r) * (1.0 - s) * (1.0 - t) * 0.25);
            out.push((1.0 + r) * (1.0 + s) * (1.0 - t) * 0.25);
            out.push((1.0 - r) * (1.0 + s) * (1.0 - t) * 0.25);
            out.push(t);
        }
        _ => unreachable!("shape_values is only defined for volume shapes"),
    }

    out
}

/// Shape function gradients (w.r.t. local coordinates) of the linearized
/// `shape` at `xi`.
pub fn shape_gradients(shape: CellType, xi: &Vector<Real>) -> ArrayVec<Vector<Real>, 8> {
    let mut out = ArrayVec::new();
    let (r, s, t) = (xi.x, xi.y, xi.z);

    match shape.linearized() {
        CellType::Tet4 => {
            out.push(Vector::new(-1.0, -1.0, -1.0));
            out.push(Vector::new(1.0, 0.0, 0.0));
            out.push(Vector::new(0.0, 1.0, 0.0));
            out.push(Vector::new(0.0, 0.0, 1.0));
        }
        CellType::Hex8 => {
            for (cr, cs, ct) in HEX8_SIGNS {
                out.push(
                    Vector::new(
                        cr * (1.0 + cs * s) * (1.0 + ct * t),
                        cs * (1.0 + cr * r) * (1.0 + ct * t),
                        ct * (1.0 + cr * r) * (1.0 + cs * s),
                    ) * 0.125,
                );
            }
        }
        CellType::Wedge6 => {
            let u = 1.0 - r - s;
            let lo = (1.0 - t) * 0.5;
            let hi = (1.0 + t) * 0.5;
            out.push(Vector::new(-lo, -lo, -u * 0.5));
            out.push(Vector::new(lo, 0.0, -r * 0.5));
            out.push(Vector::new(0.0, lo, -s * 0.5));
            out.push(Vector::new(-hi, -hi, u * 0.5));
            out.push(Vector::new(hi, 0.0, r * 0.5));
            out.push(Vector::new(0.0, hi, s * 0.5));
        }
        CellType::Pyramid5 => {
            out.push(Vector::new(
                -(1.0 - s) * (1.0 - t) * 0.25,
                -(1.0 - r) * (1.0 - t) * 0.25,
                -(1.0 - r) * (1.0 - s) * 0.25,
            ));
            out.push(Vector::new(
                (1.0 - s) * (1.0 - t) * 0.25,
                -(1.0 + r) * (1.0 - t) * 0.25,
                -(1.0 + r) * (1.0 - s) * 0.25,
            ));
            out.push(Vector::new(
                (1.0 + s) * (1.0 - t) * 0.25,
                (1.0 + r) * (1.0 - t) * 0.25,
                -(1.0 + r) * (1.0 + s) * 0.25,
            ));
            out.push(Vector::new(
                -(1.0 + s) * (1.0 - t) * 0.25,
                (1.0 - r) * (1.0 - t) * 0.25,
                -(1.0 - r) * (1.0 + s) * 0.25,
            ));
            out.push(Vector::new(0.0, 0.0, 1.0));
        }
        _ => unreachable!("shape_gradients is only defined for volume shapes"),
    }

    out
}

const HEX8_SIGNS: [(Real, Real, Real); 8] = [
    (-1.0, -1.0, -1.0),
    (1.0, -1.0, -1.0),
    (1.0, 1.0, -1.0),
    (-1.0, 1.0, -1.0),
    (-1.0, -1.0, 1.0),
    (1.0, -1.0, 1.0),
    (1.0, 1.0, 1.0),
    (-1.0, 1.0, 1.0),
];

/// The center of the reference cell, used as the Newton start.
fn reference_center(shape: CellType) -> Vector<Real> {
    match shape.linearized() {
        CellType::Tet4 => Vector::new(0.25, 0.25, 0.25),
        CellType::Hex8 => Vector::zeros(),
        CellType::Wedge6 => Vector::new(1.0 / 3.0, 1.0 / 3.0, 0.0),
        CellType::Pyramid5 => Vector::new(0.0, 0.0, 0.25),
        _ => Vector::zeros(),
    }
}

/// Interpolates nodal `values` at local coordinates `xi`.
pub fn interpolate(shape: CellType, values: &[Real], xi: &Vector<Real>) -> Real {
    shape_values(shape, xi)
        .iter()
        .zip(values.iter())
        .map(|(n, v)| n * v)
        .sum()
}

/// Physical gradient of the interpolated field `values` at `xi`.
///
/// Returns `None` when the isoparametric Jacobian is singular.
pub fn interpolate_gradient(
    shape: CellType,
    corners: &[Point<Real>],
    values: &[Real],
    xi: &Vector<Real>,
) -> Option<Vector<Real>> {
    let grads = shape_gradients(shape, xi);

    let mut jac = Matrix3::zeros();
    let mut local_grad = Vector::zeros();
    for (i, g) in grads.iter().enumerate() {
        jac += corners[i].coords * g.transpose();
        local_grad += g * values[i];
    }

    solve3(&jac.transpose(), &local_grad)
}

/// Recovers the local coordinates of the physical point `x` inside the
/// element with the given `corners`, by Newton iteration on the isoparametric
/// map. Returns `None` when the iteration does not converge.
pub fn local_coordinates(
    shape: CellType,
    corners: &[Point<Real>],
    x: &Point<Real>,
) -> Option<Vector<Real>> {
    let shape = shape.linearized();
    let mut xi = reference_center(shape);

    let scale = corners
        .iter()
        .map(|c| (c - corners[0]).norm())
        .fold(0.0, Real::max)
        .max(1.0);

    for _ in 0..20 {
        let values = shape_values(shape, &xi);
        let grads = shape_gradients(shape, &xi);

        let mut pos = Vector::zeros();
        let mut jac = Matrix3::zeros();
        for (i, (n, g)) in values.iter().zip(grads.iter()).enumerate() {
            pos += corners[i].coords * *n;
            jac += corners[i].coords * g.transpose();
        }

        let residual = x.coords - pos;
        if residual.norm() <= 1.0e-13 * scale {
            return Some(xi);
        }

        xi += solve3(&jac, &residual)?;
    }

    None
}
