//! The topology graph of a cut session.
//!
//! Entities (points, edges, sides, facets, volume cells) live in arenas owned
//! by [`CutMesh`] and reference each other through integer handles only, so
//! the cyclic adjacency of the cut topology never turns into cyclic ownership.

pub use self::entities::{
    CellId, CellState, Edge, EdgeId, Facet, FacetFlags, FacetId, OrientedFacet, Position, Side,
    SideId, SideKind, VolumeCell,
};
pub use self::mesh::CutMesh;

mod entities;
mod mesh;
