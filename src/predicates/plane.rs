use crate::math::{Point, Point2, Real, Vector};
use crate::utils::orthonormal_basis;

/// The oriented supporting plane of a side or facet.
///
/// Stored in Hessian normal form `normal · x = offset` with a unit normal,
/// together with a reference point and an orthonormal in-plane basis so that
/// 3D points can be projected to stable 2D coordinates.
#[derive(Copy, Clone, Debug)]
pub struct Plane {
    /// The unit normal of the plane.
    pub normal: Vector<Real>,
    /// The offset such that `normal · x = offset` for points `x` on the plane.
    pub offset: Real,
    origin: Point<Real>,
    basis: [Vector<Real>; 2],
}

impl Plane {
    /// Fits a plane through a polygon loop using Newell's method.
    ///
    /// The normal follows the winding of the loop (counterclockwise loops seen
    /// from the normal direction). Returns `None` for degenerate loops whose
    /// Newell normal vanishes.
    pub fn from_points(points: &[Point<Real>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut normal = Vector::zeros();
        let mut center = Vector::zeros();

        for i in 0..points.len() {
            let p = &points[i];
            let q = &points[(i + 1) % points.len()];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
            center += p.coords;
        }

        let normal = normal.try_normalize(0.0)?;
        let origin = Point::from(center / points.len() as Real);
        let basis = orthonormal_basis(&normal);

        Some(Plane {
            normal,
            offset: normal.dot(&origin.coords),
            origin,
            basis,
        })
    }

    /// Builds a plane from a unit normal and a point on the plane.
    pub fn from_point_and_normal(origin: Point<Real>, normal: Vector<Real>) -> Option<Self> {
        let normal = normal.try_normalize(0.0)?;
        Some(Plane {
            normal,
            offset: normal.dot(&origin.coords),
            origin,
            basis: orthonormal_basis(&normal),
        })
    }

    /// The signed distance from `p` to the plane, positive on the normal side.
    pub fn signed_distance(&self, p: &Point<Real>) -> Real {
        self.normal.dot(&p.coords) - self.offset
    }

    /// The reference point the in-plane coordinates are measured from.
    pub fn origin(&self) -> Point<Real> {
        self.origin
    }

    /// Projects a 3D point into the in-plane 2D coordinate system.
    pub fn project2d(&self, p: &Point<Real>) -> Point2<Real> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.basis[0]), d.dot(&self.basis[1]))
    }

    /// Maps in-plane 2D coordinates back to 3D.
    pub fn unproject(&self, p: &Point2<Real>) -> Point<Real> {
        self.origin + self.basis[0] * p.x + self.basis[1] * p.y
    }

    /// This plane with its orientation reversed.
    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            offset: -self.offset,
            origin: self.origin,
            basis: [self.basis[1], self.basis[0]],
        }
    }

    /// The largest absolute distance of any of `points` to this plane.
    pub fn max_deviation(&self, points: &[Point<Real>]) -> Real {
        points
            .iter()
            .map(|p| self.signed_distance(p).abs())
            .fold(0.0, Real::max)
    }
}

#[cfg(test)]
mod test {
    use super::Plane;
    use crate::math::Point;

    #[test]
    fn newell_fit_of_planar_quad() {
        let pts = [
            Point::new(0.0, 0.0, 1.0),
            Point::new(1.0, 0.0, 1.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(0.0, 1.0, 1.0),
        ];
        let plane = Plane::from_points(&pts).unwrap();
        assert_relative_eq!(plane.normal.z.abs(), 1.0, epsilon = 1.0e-12);
        for p in &pts {
            assert_relative_eq!(plane.signed_distance(p), 0.0, epsilon = 1.0e-12);
        }
        assert_relative_eq!(plane.max_deviation(&pts), 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn projection_roundtrip() {
        let pts = [
            Point::new(0.2, 0.0, 0.0),
            Point::new(1.0, 0.3, 0.0),
            Point::new(0.7, 1.0, 1.1),
        ];
        let plane = Plane::from_points(&pts).unwrap();
        for p in &pts {
            let q = plane.unproject(&plane.project2d(p));
            assert_relative_eq!((q - p).norm(), 0.0, epsilon = 1.0e-12);
        }
    }
}
