//! The recursive cut.
//!
//! When a cell's tessellation is crossed by residual cut surface (a dangling
//! facet that does not separate the cell: flat ridges, near-coplanar
//! configurations, slivers), the engine rebuilds the offending region as a
//! local child mesh of tet elements, registers the residual cut sides on it,
//! and re-runs the whole pipeline on every tet. Child results are mapped back
//! through a bidirectional parent↔child point identity map and replace the
//! parent cell's integration description.

use crate::integration::{BoundaryIntegrationPoint, IntegrationPoint};
use crate::math::{Point, Real};
use crate::pool::PointId;
use crate::session::element::{cut_element, CutSideDescriptor};
use crate::session::{CutError, CutOptions};
use crate::shape::CellType;
use crate::topology::CutMesh;
use std::collections::HashMap;

/// The recursive cut of the tets of one volume cell.
pub(crate) struct TetMeshIntersection<'a> {
    opts: &'a CutOptions,
    depth: usize,
    /// Parent pool id → child pool id, per child element.
    parent_to_child: Vec<HashMap<PointId, PointId>>,
    /// Child pool id → parent pool id, per child element.
    child_to_parent: Vec<HashMap<PointId, PointId>>,
}

impl<'a> TetMeshIntersection<'a> {
    pub(crate) fn new(opts: &'a CutOptions, depth: usize) -> Self {
        TetMeshIntersection {
            opts,
            depth,
            parent_to_child: Vec::new(),
            child_to_parent: Vec::new(),
        }
    }

    /// Re-cuts the given tets against the residual cut sides and returns the
    /// combined integration description.
    ///
    /// New points discovered in the children are registered in the parent
    /// pool so the identity maps stay bidirectional.
    pub(crate) fn cut(
        &mut self,
        parent: &mut CutMesh,
        tets: &[[PointId; 4]],
        residual: &[CutSideDescriptor],
    ) -> Result<(Vec<IntegrationPoint>, Vec<BoundaryIntegrationPoint>), CutError> {
        let mut points = Vec::new();
        let mut boundary = Vec::new();

        for (ti, tet) in tets.iter().enumerate() {
            let corners: Vec<Point<Real>> = tet.iter().map(|p| parent.point(*p)).collect();

            let outcome = cut_element(
                ti as u32,
                CellType::Tet4,
                &corners,
                residual,
                None,
                self.opts,
                self.depth,
                true,
            )?;

            // Bidirectional identity map between the pools. Child points that
            // are new to the parent (cut points on tet faces) are registered
            // in the parent pool.
            let mut to_child: HashMap<PointId, PointId> = HashMap::new();
            let mut to_parent: HashMap<PointId, PointId> = HashMap::new();
            for (child_id, coords) in outcome.mesh.pool().iter() {
                let parent_id = parent.insert_point(coords);
                let _ = to_child.insert(parent_id, child_id);
                let _ = to_parent.insert(child_id, parent_id);
            }
            self.parent_to_child.push(to_child);
            self.child_to_parent.push(to_parent);

            for cell in outcome.cells {
                points.extend(cell.points);
                boundary.extend(cell.boundary);
            }
        }

        log::debug!(
            "recursive cut: {} tets re-cut against {} residual side(s), {} points",
            tets.len(),
            residual.len(),
            points.len()
        );

        Ok((points, boundary))
    }

    /// Maps a parent point id into the `child`-th re-cut tet, if present.
    pub(crate) fn to_child(&self, child: usize, point: PointId) -> Option<PointId> {
        self.parent_to_child.get(child)?.get(&point).copied()
    }

    /// Maps a point of the `child`-th re-cut tet back into the parent pool.
    pub(crate) fn to_parent(&self, child: usize, point: PointId) -> Option<PointId> {
        self.child_to_parent.get(child)?.get(&point).copied()
    }
}

/// Convenience wrapper around [`TetMeshIntersection`] for one cell.
pub(crate) fn recursive_cut(
    parent: &mut CutMesh,
    tets: &[[PointId; 4]],
    residual: &[CutSideDescriptor],
    opts: &CutOptions,
    depth: usize,
) -> Result<(Vec<IntegrationPoint>, Vec<BoundaryIntegrationPoint>), CutError> {
    let mut intersection = TetMeshIntersection::new(opts, depth);
    intersection.cut(parent, tets, residual)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;

    /// Re-cutting a single tet against a plane that slices it must conserve
    /// its volume and keep the point identity maps bidirectional.
    #[test]
    fn recut_single_tet_against_plane() {
        let mut parent = CutMesh::new(1.0e-12);
        let ids = [
            parent.insert_point(Point::new(0.0, 0.0, 0.0)),
            parent.insert_point(Point::new(0.0, 1.0, 0.0)),
            parent.insert_point(Point::new(1.0, 0.0, 0.0)),
            parent.insert_point(Point::new(0.0, 0.0, 1.0)),
        ];
        let tets = [[ids[0], ids[1], ids[2], ids[3]]];

        let residual = [CutSideDescriptor {
            external_id: 42,
            corners: vec![
                Point::new(-1.0, -1.0, 0.25),
                Point::new(3.0, -1.0, 0.25),
                Point::new(-1.0, 3.0, 0.25),
            ],
        }];

        let opts = CutOptions::default();
        let mut intersection = TetMeshIntersection::new(&opts, 1);
        let (points, boundary) = intersection
            .cut(&mut parent, &tets, &residual)
            .unwrap();

        let volume: f64 = points.iter().map(|p| p.weight).sum();
        assert_relative_eq!(volume, 1.0 / 6.0, epsilon = 1.0e-10);

        // The cut plane slices the tet: surface points must exist and carry
        // the originating side id.
        assert!(!boundary.is_empty());
        assert!(boundary.iter().all(|b| b.side_id == 42));

        // Identity maps: all four parent corners are known to the child.
        for id in ids {
            let child = intersection.to_child(0, id).unwrap();
            assert_eq!(intersection.to_parent(0, child), Some(id));
        }
    }
}
