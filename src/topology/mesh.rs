use crate::math::{Point, Real};
use crate::pool::{PointId, PointPool};
use crate::predicates::Plane;
use crate::topology::{
    CellId, Edge, EdgeId, Facet, FacetId, Side, SideId, SideKind, VolumeCell,
};
use crate::utils::SortedPair;
use std::collections::HashMap;

/// Arena-owner of the whole cut topology of one element cut.
///
/// The mesh owns the point pool and all edges, sides, facets and volume
/// cells. Every adjacency is stored as a handle; iterating an arena visits
/// entities in creation order, which is deterministic for identical input.
#[derive(Clone, Debug)]
pub struct CutMesh {
    pool: PointPool,
    edges: Vec<Edge>,
    edge_lookup: HashMap<SortedPair<PointId>, EdgeId>,
    sides: Vec<Side>,
    facets: Vec<Facet>,
    cells: Vec<VolumeCell>,
}

impl CutMesh {
    /// Creates an empty mesh whose point pool uses the given tolerance.
    pub fn new(position_tolerance: Real) -> Self {
        CutMesh {
            pool: PointPool::new(position_tolerance),
            edges: Vec::new(),
            edge_lookup: HashMap::new(),
            sides: Vec::new(),
            facets: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// The point pool of this mesh.
    pub fn pool(&self) -> &PointPool {
        &self.pool
    }

    /// Registers a point, deduplicated by the pool tolerance.
    pub fn insert_point(&mut self, p: Point<Real>) -> PointId {
        self.pool.insert(p)
    }

    /// Coordinates of a pooled point.
    #[inline]
    pub fn point(&self, id: PointId) -> Point<Real> {
        self.pool.point(id)
    }

    /// Returns the edge between `a` and `b`, creating it if it does not exist.
    ///
    /// Edges are unique per unordered endpoint pair.
    pub fn add_edge(&mut self, a: PointId, b: PointId) -> EdgeId {
        debug_assert_ne!(a, b, "degenerate edge");
        let key = SortedPair::new(a, b);
        if let Some(id) = self.edge_lookup.get(&key) {
            return *id;
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge::new(a, b));
        let _ = self.edge_lookup.insert(key, id);
        id
    }

    /// The edge between `a` and `b`, if it was created.
    pub fn edge_between(&self, a: PointId, b: PointId) -> Option<EdgeId> {
        self.edge_lookup.get(&SortedPair::new(a, b)).copied()
    }

    /// Immutable access to an edge.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Mutable access to an edge.
    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.index()]
    }

    /// Iterates all edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    /// Creates a side from an ordered corner loop.
    ///
    /// The loop edges are created (or reused) in the mesh and the side plane
    /// is fitted with Newell's method. Returns `None` for loops too degenerate
    /// to carry a plane.
    pub fn add_side(&mut self, kind: SideKind, points: Vec<PointId>) -> Option<SideId> {
        let coords: Vec<Point<Real>> = points.iter().map(|p| self.point(*p)).collect();
        let plane = Plane::from_points(&coords)?;

        let mut edges = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            edges.push(self.add_edge(a, b));
        }

        let tris = triangulate_loop(&points, &coords);

        let id = SideId(self.sides.len() as u32);
        self.sides.push(Side {
            kind,
            points,
            edges,
            plane,
            tris,
        });
        Some(id)
    }

    /// Creates a side triangulated as a fan around `center` instead of the
    /// default loop triangulation. Used for level-set patches whose loops can
    /// be non-planar or have more than four corners.
    pub fn add_fan_side(
        &mut self,
        kind: SideKind,
        points: Vec<PointId>,
        center: PointId,
    ) -> Option<SideId> {
        let coords: Vec<Point<Real>> = points.iter().map(|p| self.point(*p)).collect();
        let plane = Plane::from_points(&coords)?;

        let mut edges = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            edges.push(self.add_edge(a, b));
        }

        let mut tris = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            if a != center && b != center {
                tris.push([a, b, center]);
            }
        }

        let id = SideId(self.sides.len() as u32);
        self.sides.push(Side {
            kind,
            points,
            edges,
            plane,
            tris,
        });
        Some(id)
    }

    /// Immutable access to a side.
    #[inline]
    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.index()]
    }

    /// Mutable access to a side.
    #[inline]
    pub fn side_mut(&mut self, id: SideId) -> &mut Side {
        &mut self.sides[id.index()]
    }

    /// Iterates all sides in creation order.
    pub fn sides(&self) -> impl Iterator<Item = (SideId, &Side)> {
        self.sides
            .iter()
            .enumerate()
            .map(|(i, s)| (SideId(i as u32), s))
    }

    /// Number of sides.
    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    /// Adds a facet to the arena.
    pub fn add_facet(&mut self, facet: Facet) -> FacetId {
        let id = FacetId(self.facets.len() as u32);
        self.facets.push(facet);
        id
    }

    /// Immutable access to a facet.
    #[inline]
    pub fn facet(&self, id: FacetId) -> &Facet {
        &self.facets[id.index()]
    }

    /// Mutable access to a facet.
    #[inline]
    pub fn facet_mut(&mut self, id: FacetId) -> &mut Facet {
        &mut self.facets[id.index()]
    }

    /// Iterates all facets in creation order.
    pub fn facets(&self) -> impl Iterator<Item = (FacetId, &Facet)> {
        self.facets
            .iter()
            .enumerate()
            .map(|(i, f)| (FacetId(i as u32), f))
    }

    /// Number of facets.
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Adds a volume cell to the arena.
    pub fn add_cell(&mut self, cell: VolumeCell) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        id
    }

    /// Immutable access to a volume cell.
    #[inline]
    pub fn cell(&self, id: CellId) -> &VolumeCell {
        &self.cells[id.index()]
    }

    /// Mutable access to a volume cell.
    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> &mut VolumeCell {
        &mut self.cells[id.index()]
    }

    /// Iterates all volume cells in creation order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &VolumeCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (CellId(i as u32), c))
    }

    /// Number of volume cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The (up to two) volume cells incident to a facet: negative side first.
    pub fn adjacent_volume_cells(&self, facet: FacetId) -> [Option<CellId>; 2] {
        self.facet(facet).cells
    }
}

/// Triangulates a tri/quad corner loop.
///
/// Quads split along the diagonal whose two triangles are most coplanar, so
/// mildly warped quads keep a consistent geometric interpretation.
fn triangulate_loop(points: &[PointId], coords: &[Point<Real>]) -> Vec<[PointId; 3]> {
    match points.len() {
        3 => vec![[points[0], points[1], points[2]]],
        4 => {
            let n = |a: usize, b: usize, c: usize| {
                (coords[b] - coords[a])
                    .cross(&(coords[c] - coords[a]))
                    .normalize()
            };
            // Split 0-2 vs. split 1-3: prefer the more planar pair.
            let split02 = n(0, 1, 2).dot(&n(0, 2, 3));
            let split13 = n(1, 2, 3).dot(&n(1, 3, 0));
            if split02 >= split13 {
                vec![
                    [points[0], points[1], points[2]],
                    [points[0], points[2], points[3]],
                ]
            } else {
                vec![
                    [points[1], points[2], points[3]],
                    [points[1], points[3], points[0]],
                ]
            }
        }
        _ => {
            // General fan; sides ingested by the engine are tris or quads, the
            // fan only serves synthetic sides (level-set patches).
            let mut tris = Vec::with_capacity(points.len().saturating_sub(2));
            for i in 1..points.len() - 1 {
                tris.push([points[0], points[i], points[i + 1]]);
            }
            tris
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;
    use crate::topology::SideKind;

    #[test]
    fn edges_deduplicate_by_endpoint_pair() {
        let mut mesh = CutMesh::new(1.0e-12);
        let a = mesh.insert_point(Point::new(0.0, 0.0, 0.0));
        let b = mesh.insert_point(Point::new(1.0, 0.0, 0.0));
        let e1 = mesh.add_edge(a, b);
        let e2 = mesh.add_edge(b, a);
        assert_eq!(e1, e2);
        assert_eq!(mesh.edges().count(), 1);
    }

    #[test]
    fn edge_cuts_stay_in_parametric_order() {
        let mut mesh = CutMesh::new(1.0e-12);
        let a = mesh.insert_point(Point::new(0.0, 0.0, 0.0));
        let b = mesh.insert_point(Point::new(1.0, 0.0, 0.0));
        let e = mesh.add_edge(a, b);

        let p70 = mesh.insert_point(Point::new(0.7, 0.0, 0.0));
        let p20 = mesh.insert_point(Point::new(0.2, 0.0, 0.0));
        mesh.edge_mut(e).add_cut(0.7, p70);
        mesh.edge_mut(e).add_cut(0.2, p20);
        // Re-registering an existing cut point is a no-op.
        mesh.edge_mut(e).add_cut(0.2, p20);

        assert_eq!(mesh.edge(e).split_points(), vec![a, p20, p70, b]);
        let params: Vec<f64> = mesh.edge(e).cuts().map(|(t, _)| t).collect();
        assert_eq!(params, vec![0.2, 0.7]);
    }

    #[test]
    fn side_creation_builds_loop_edges() {
        let mut mesh = CutMesh::new(1.0e-12);
        let pts: Vec<_> = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
        .iter()
        .map(|p| mesh.insert_point(*p))
        .collect();

        let side = mesh
            .add_side(SideKind::Cut { external_id: 7 }, pts.clone())
            .unwrap();
        assert_eq!(mesh.side(side).edges.len(), 4);
        assert_eq!(mesh.side(side).tris.len(), 2);
        assert_eq!(mesh.edges().count(), 4);
        assert!(mesh.edge_between(pts[0], pts[1]).is_some());
    }
}
