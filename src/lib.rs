/*!
carve3d
========

**carve3d** is a geometric cutting library for 3-dimensional finite elements,
written with the rust programming language.

Given a background element (tet, hex, wedge or pyramid) and a set of cut
surfaces — explicit triangles/quads or the zero isocontour of a nodal
level-set field — it produces a topologically consistent decomposition of the
element interior into volume cells, and for each cell an integration
description: either a tessellation into tetrahedral sub-cells, or a
direct-divergence set of surface-derived Gauss points. Surface integrals on
the cut are exposed as boundary cells with outward normals.

The entry point is [`session::CutSession`].
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::type_complexity)]

#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod cells;
pub mod divergence;
pub mod facets;
pub mod integration;
pub mod intersect;
pub mod levelset;
pub mod pool;
pub mod predicates;
pub mod session;
pub mod shape;
pub mod tessellation;
pub mod tetmesh;
pub mod topology;
pub mod utils;

/// Aliases for the mathematical types used throughout this crate.
pub mod math {
    /// The scalar type used throughout this crate.
    pub type Real = f64;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    pub use na::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

    /// The point type.
    pub use na::Point3 as Point;

    /// The vector type.
    pub use na::Vector3 as Vector;
}

pub use crate::session::{
    CellResult, CutError, CutOptions, CutResult, CutSession, ElementHandle, ElementResult,
    IntegrationStrategy, SideHandle, SignSource,
};
pub use crate::shape::CellType;
pub use crate::topology::Position;
