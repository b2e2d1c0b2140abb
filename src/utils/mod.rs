//! Various unsorted geometrical and logical operators.

pub use self::linalg::{solve3, solve4};
pub use self::orthonormal::orthonormal_basis;
pub use self::point_in_poly2d::{point_in_convex_poly2d, point_in_poly2d};
pub use self::segments_intersection::{
    segments_intersection2d, SegmentPointLocation, SegmentsIntersection,
};
pub use self::sorted_pair::SortedPair;
pub(crate) use self::spade::sanitize_spade_point;

mod linalg;
mod orthonormal;
mod point_in_poly2d;
mod segments_intersection;
mod sorted_pair;
mod spade;
