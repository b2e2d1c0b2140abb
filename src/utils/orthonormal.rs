use crate::math::{Real, Vector};

/// Computes an orthonormal basis of the plane orthogonal to `n`.
///
/// `n` does not need to be normalized. The returned vectors are unit length
/// and `(basis[0], basis[1], n)` forms a right-handed frame.
pub fn orthonormal_basis(n: &Vector<Real>) -> [Vector<Real>; 2] {
    // Build the first tangent from the smallest component of `n` so the
    // cross product stays well-conditioned.
    let tangent = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector::new(0.0, -n.z, n.y)
    } else if n.y.abs() <= n.z.abs() {
        Vector::new(-n.z, 0.0, n.x)
    } else {
        Vector::new(-n.y, n.x, 0.0)
    };

    let t1 = tangent.normalize();
    let t2 = n.cross(&t1).normalize();
    [t1, t2]
}
