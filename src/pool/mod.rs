//! The deduplicated point pool.
//!
//! Every geometric location created during a cut session — element nodes, cut
//! side nodes, intersection points, Steiner points — is registered here. Two
//! insertions whose coordinates coincide within the pool tolerance resolve to
//! the same [`PointId`]. Identities are assigned in insertion order and never
//! reused, which makes topology iteration deterministic run-to-run.

use crate::math::{Point, Real};
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// The stable identity of a pooled point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u32);

impl PointId {
    /// The arena index of this point.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

type TreeEntry = GeomWithData<[Real; 3], u32>;

/// Tolerance-deduplicated store of the geometric points of one cut session.
#[derive(Clone)]
pub struct PointPool {
    points: Vec<Point<Real>>,
    tree: RTree<TreeEntry>,
    tolerance: Real,
}

impl std::fmt::Debug for PointPool {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PointPool")
            .field("len", &self.points.len())
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl PointPool {
    /// Creates an empty pool with the given coincidence tolerance.
    pub fn new(tolerance: Real) -> Self {
        PointPool {
            points: Vec::new(),
            tree: RTree::new(),
            tolerance,
        }
    }

    /// The coincidence tolerance of this pool.
    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    /// Number of distinct points in the pool.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no point was inserted yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the id of the existing point within tolerance of `p`, or
    /// inserts `p` as a fresh point.
    ///
    /// When several pooled points fall within tolerance, the geometrically
    /// closest one wins; ties break on the smaller id so the result does not
    /// depend on spatial-index internals.
    pub fn insert(&mut self, p: Point<Real>) -> PointId {
        if let Some(existing) = self.find(&p) {
            return existing;
        }

        let id = self.points.len() as u32;
        self.points.push(p);
        self.tree.insert(TreeEntry::new([p.x, p.y, p.z], id));
        PointId(id)
    }

    /// Looks up the existing point within tolerance of `p` without inserting.
    pub fn find(&self, p: &Point<Real>) -> Option<PointId> {
        let mut best: Option<(Real, u32)> = None;

        for entry in self
            .tree
            .locate_within_distance([p.x, p.y, p.z], self.tolerance * self.tolerance)
        {
            let q = self.points[entry.data as usize];
            let dist = (q - p).norm_squared();
            let candidate = (dist, entry.data);
            match best {
                Some(b) if (b.0, b.1) <= candidate => {}
                _ => best = Some(candidate),
            }
        }

        best.map(|(_, id)| PointId(id))
    }

    /// The coordinates of the point with the given id.
    #[inline]
    pub fn point(&self, id: PointId) -> Point<Real> {
        self.points[id.index()]
    }

    /// Iterates over all points in insertion (= id) order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, Point<Real>)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (PointId(i as u32), *p))
    }
}
