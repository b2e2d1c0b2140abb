use crate::math::{Point, Real};
use crate::pool::PointId;
use crate::predicates::Plane;
use ordered_float::OrderedFloat;

/// Handle of an [`Edge`] in the mesh arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

/// Handle of a [`Side`] in the mesh arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SideId(pub u32);

/// Handle of a [`Facet`] in the mesh arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FacetId(pub u32);

/// Handle of a [`VolumeCell`] in the mesh arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u32);

impl EdgeId {
    /// The arena index of this edge.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SideId {
    /// The arena index of this side.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FacetId {
    /// The arena index of this facet.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl CellId {
    /// The arena index of this cell.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Inside/outside classification relative to the cut, used for volume cells
/// and for node tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
    /// On the side the cut normal points away from (resp. the negative
    /// level-set side).
    Inside,
    /// On the side the cut normal points into (resp. the positive level-set
    /// side).
    Outside,
    /// Directly on the cut surface. Only used for node tags.
    OnCutSurface,
    /// Not adjacent to any cut surface (uncut element).
    Undecided,
}

/// Pipeline state of a volume cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellState {
    /// Cell discovered, integration not attempted yet.
    Raw,
    /// Integration sub-cells generated by the tessellator.
    Tessellated,
    /// The tessellation crossed residual cut sides and the cell was handed to
    /// the recursive cut.
    Recursive,
    /// Direct-divergence integration points generated.
    DirectDivergence,
    /// Final: the cell carries a valid integration description.
    Accepted,
    /// Final: every escalation failed for this cell.
    FailedGiveUp,
}

/// An edge of the cut topology.
///
/// Unique per unordered point pair; carries the cut points produced on it in
/// parametric order.
#[derive(Clone, Debug)]
pub struct Edge {
    ends: [PointId; 2],
    cuts: Vec<(OrderedFloat<Real>, PointId)>,
}

impl Edge {
    pub(crate) fn new(a: PointId, b: PointId) -> Self {
        Edge {
            ends: [a, b],
            cuts: Vec::new(),
        }
    }

    /// The two endpoints, in creation order.
    #[inline]
    pub fn ends(&self) -> [PointId; 2] {
        self.ends
    }

    /// Registers a cut point at parameter `t` (measured from `ends()[0]`).
    ///
    /// Duplicate registrations of the same point are ignored.
    pub fn add_cut(&mut self, t: Real, point: PointId) {
        if self.cuts.iter().any(|(_, p)| *p == point) {
            return;
        }
        let key = OrderedFloat(t);
        let pos = self.cuts.partition_point(|(u, _)| *u < key);
        self.cuts.insert(pos, (key, point));
    }

    /// The cut points on this edge, in parametric order.
    pub fn cuts(&self) -> impl Iterator<Item = (Real, PointId)> + '_ {
        self.cuts.iter().map(|(t, p)| (t.into_inner(), *p))
    }

    /// Both endpoints and all cut points, walking from `ends()[0]` to
    /// `ends()[1]`. Consecutive pairs are the sub-segments of the edge.
    pub fn split_points(&self) -> Vec<PointId> {
        let mut out = Vec::with_capacity(self.cuts.len() + 2);
        out.push(self.ends[0]);
        for (_, p) in &self.cuts {
            if *p != self.ends[0] && *p != self.ends[1] {
                out.push(*p);
            }
        }
        out.push(self.ends[1]);
        out
    }
}

/// Whether a side belongs to the background element boundary or to the cut.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SideKind {
    /// Face `face` of the background element.
    Element {
        /// Local face index within the element shape.
        face: usize,
    },
    /// A cut side, carrying the external id given on ingest.
    Cut {
        /// The caller-supplied side id.
        external_id: u32,
    },
}

/// A polygonal side: an element face or a cut surface piece.
#[derive(Clone, Debug)]
pub struct Side {
    /// Element face or cut side.
    pub kind: SideKind,
    /// The ordered corner loop.
    pub points: Vec<PointId>,
    /// The edges of the corner loop, in loop order.
    pub edges: Vec<EdgeId>,
    /// The Newell plane fit of the corner loop.
    pub plane: Plane,
    /// A triangulation of the side used for the intersection kernel.
    pub tris: Vec<[PointId; 3]>,
}

impl Side {
    /// True if this side stems from a cut surface.
    pub fn is_cut_side(&self) -> bool {
        matches!(self.kind, SideKind::Cut { .. })
    }

    /// The external id of a cut side, if any.
    pub fn external_id(&self) -> Option<u32> {
        match self.kind {
            SideKind::Cut { external_id } => Some(external_id),
            SideKind::Element { .. } => None,
        }
    }
}

bitflags::bitflags! {
    /// Attributes of a facet.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FacetFlags: u8 {
        /// The facet lies on a cut side.
        const ON_CUT_SIDE = 1 << 0;
        /// The facet lies on an element side.
        const ON_ELEMENT_SIDE = 1 << 1;
        /// The facet is shared between a coplanar cut side and an element side.
        const COPLANAR = 1 << 2;
        /// The facet was generated from a level-set isocontour.
        const LEVEL_SET = 1 << 3;
    }
}

/// A maximal planar region of a side lying inside the background element.
#[derive(Clone, Debug)]
pub struct Facet {
    /// The side this facet was carved from.
    pub side: SideId,
    /// The boundary loop of the region, empty when the region is not simple.
    pub ring: Vec<PointId>,
    /// The triangles covering the region.
    pub tris: Vec<[PointId; 3]>,
    /// The supporting plane (orientation of the parent side).
    pub plane: Plane,
    /// Attribute flags.
    pub flags: FacetFlags,
    /// For facets carrying cut surface: the cut side that produced them. Also
    /// set on element-side facets covered by a coplanar cut side.
    pub cut_source: Option<SideId>,
    /// The volume cells on the negative resp. positive side of the plane.
    pub cells: [Option<CellId>; 2],
}

impl Facet {
    /// True if both sides of the facet resolved to the same cell, i.e. the
    /// facet does not separate two regions.
    pub fn is_dangling(&self) -> bool {
        self.cells[0].is_some() && self.cells[0] == self.cells[1]
    }
}

/// A facet on the boundary of a volume cell, with the cell's sidedness.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrientedFacet {
    /// The facet handle.
    pub facet: FacetId,
    /// True when the cell lies on the positive side of the facet plane. The
    /// outward normal of the cell at this facet is then the *flipped* plane
    /// normal.
    pub cell_on_plus_side: bool,
}

/// A connected open region of the element interior bounded by facets.
#[derive(Clone, Debug)]
pub struct VolumeCell {
    /// The oriented boundary of the cell.
    pub boundary: Vec<OrientedFacet>,
    /// Inside/outside classification.
    pub position: Position,
    /// Pipeline state.
    pub state: CellState,
    /// The volume enclosed by the oriented boundary.
    pub volume: Real,
    /// The volume centroid.
    pub centroid: Point<Real>,
}
