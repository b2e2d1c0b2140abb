//! The intersection kernel.
//!
//! Computes all intersection points and polylines between the background
//! element and the cut sides: element-edge × cut-side and cut-side-edge ×
//! element-side point intersections, and side × side intersection segments.
//! Every intersection is classified as a proper cut, a touch (snapped to the
//! existing entity), a coplanar overlap, or a miss; the tolerance decides, and
//! touches never create new points.

use crate::math::{Point, Point2, Real};
use crate::pool::PointId;
use crate::predicates::Plane;
use crate::topology::{CutMesh, EdgeId, SideId};
use smallvec::SmallVec;

/// Classification of a single intersection computation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntersectionClass {
    /// Proper transversal crossing.
    Cut,
    /// The intersection coincides with an existing point; it was snapped.
    TouchPoint,
    /// The intersection lies along an existing edge; registered as a split.
    TouchEdge,
    /// The two sides share their plane.
    Coplanar,
    /// No intersection.
    Miss,
}

/// An intersection segment between two sides.
///
/// The segment lies in both sides' planes; its endpoints are pooled points.
/// `sides` lists every side the segment lies on (two, or more when several
/// sides meet along the same line).
#[derive(Clone, Debug)]
pub struct CutSegment {
    /// First endpoint.
    pub a: PointId,
    /// Second endpoint.
    pub b: PointId,
    /// The sides this segment lies on.
    pub sides: SmallVec<[SideId; 4]>,
}

/// All intersections discovered between the element sides and the cut sides.
#[derive(Clone, Debug, Default)]
pub struct IntersectionSet {
    /// Intersection segments (the "cut lines" of the facet builder).
    pub segments: Vec<CutSegment>,
    /// Isolated points known to lie on a side (edge piercings, touch points).
    pub points_on_side: Vec<(SideId, PointId)>,
}

impl IntersectionSet {
    /// Iterates the segments lying on the given side.
    pub fn segments_on(&self, side: SideId) -> impl Iterator<Item = &CutSegment> {
        self.segments.iter().filter(move |s| s.sides.contains(&side))
    }

    /// Iterates the registered isolated points on the given side.
    pub fn points_on(&self, side: SideId) -> impl Iterator<Item = PointId> + '_ {
        self.points_on_side
            .iter()
            .filter(move |(s, _)| *s == side)
            .map(|(_, p)| *p)
    }

    fn push_segment(&mut self, a: PointId, b: PointId, on: &[SideId]) {
        if a == b {
            return;
        }
        // Merge with an existing segment over the same endpoints: several side
        // pairs can produce the same geometric line (e.g. two cut sides meeting
        // along a shared edge on an element face).
        for seg in &mut self.segments {
            if (seg.a == a && seg.b == b) || (seg.a == b && seg.b == a) {
                for s in on {
                    if !seg.sides.contains(s) {
                        seg.sides.push(*s);
                    }
                }
                return;
            }
        }
        self.segments.push(CutSegment {
            a,
            b,
            sides: SmallVec::from_slice(on),
        });
    }

    fn push_point(&mut self, side: SideId, p: PointId) {
        if !self.points_on_side.contains(&(side, p)) {
            self.points_on_side.push((side, p));
        }
    }
}

/// Tolerances used by the kernel, all in absolute units of the element.
#[derive(Copy, Clone, Debug)]
pub struct Tolerances {
    /// Coincidence tolerance (the pool tolerance).
    pub point: Real,
    /// "End of edge" parametric tolerance.
    pub param: Real,
}

/// Runs the full intersection pass between `element_sides` and `cut_sides`.
///
/// Cut points are registered on the mesh edges; segments and isolated points
/// are collected in the returned [`IntersectionSet`].
pub fn find_intersections(
    mesh: &mut CutMesh,
    element_sides: &[SideId],
    cut_sides: &[SideId],
    tol: &Tolerances,
) -> IntersectionSet {
    let mut set = IntersectionSet::default();

    // Element edge × cut side piercings.
    let element_edges = collect_side_edges(mesh, element_sides);
    for edge in &element_edges {
        for &cut in cut_sides {
            intersect_edge_side(mesh, *edge, cut, tol, &mut set);
        }
    }

    // Cut-side edge × element side piercings.
    let cut_edges = collect_side_edges(mesh, cut_sides);
    for edge in &cut_edges {
        for &elem in element_sides {
            intersect_edge_side(mesh, *edge, elem, tol, &mut set);
        }
    }

    // Cut-side edge × cut side piercings (independent cut surfaces crossing).
    for edge in &cut_edges {
        for &cut in cut_sides {
            let on_side = mesh.side(cut).edges.contains(edge);
            if !on_side {
                intersect_edge_side(mesh, *edge, cut, tol, &mut set);
            }
        }
    }

    // Side × side intersection segments.
    for (i, &cut) in cut_sides.iter().enumerate() {
        for &elem in element_sides {
            intersect_side_pair(mesh, cut, elem, tol, &mut set);
        }
        for &other in cut_sides.iter().skip(i + 1) {
            intersect_side_pair(mesh, cut, other, tol, &mut set);
        }
    }

    split_crossing_segments(mesh, &mut set, tol);

    log::debug!(
        "intersection pass: {} segments, {} isolated side points",
        set.segments.len(),
        set.points_on_side.len()
    );

    set
}

fn collect_side_edges(mesh: &CutMesh, sides: &[SideId]) -> Vec<EdgeId> {
    let mut out = Vec::new();
    for &s in sides {
        for &e in &mesh.side(s).edges {
            if !out.contains(&e) {
                out.push(e);
            }
        }
    }
    out
}

/// Intersects one edge with one side and registers the outcome.
fn intersect_edge_side(
    mesh: &mut CutMesh,
    edge: EdgeId,
    side: SideId,
    tol: &Tolerances,
    set: &mut IntersectionSet,
) -> IntersectionClass {
    let [pa, pb] = mesh.edge(edge).ends();
    let a = mesh.point(pa);
    let b = mesh.point(pb);

    let plane = mesh.side(side).plane;
    let d0 = plane.signed_distance(&a);
    let d1 = plane.signed_distance(&b);

    if d0.abs() <= tol.point && d1.abs() <= tol.point {
        // Edge lies in the side plane: handled by the side-pair overlap.
        return IntersectionClass::TouchEdge;
    }

    if (d0 > tol.point && d1 > tol.point) || (d0 < -tol.point && d1 < -tol.point) {
        return IntersectionClass::Miss;
    }

    let t = d0 / (d0 - d1);
    let hit = a + (b - a) * t;

    if !point_in_side(mesh, side, &hit, tol.point) {
        return IntersectionClass::Miss;
    }

    let edge_len = (b - a).norm();
    let t_eps = (tol.param / edge_len).max(1.0e-12);

    if t <= t_eps {
        // Snap to the edge start.
        set.push_point(side, pa);
        return IntersectionClass::TouchPoint;
    }
    if t >= 1.0 - t_eps {
        set.push_point(side, pb);
        return IntersectionClass::TouchPoint;
    }

    let id = mesh.insert_point(hit);
    mesh.edge_mut(edge).add_cut(t, id);
    set.push_point(side, id);
    log::trace!(
        "edge {:?} cut by side {:?} at t = {:.3e}",
        edge,
        side,
        t
    );
    IntersectionClass::Cut
}

/// Intersects a pair of sides and registers the resulting segment (or the
/// shared polygon of coplanar pairs).
fn intersect_side_pair(
    mesh: &mut CutMesh,
    s1: SideId,
    s2: SideId,
    tol: &Tolerances,
    set: &mut IntersectionSet,
) -> IntersectionClass {
    let plane1 = mesh.side(s1).plane;
    let plane2 = mesh.side(s2).plane;

    let dir = plane1.normal.cross(&plane2.normal);

    if dir.norm() <= 1.0e-10 {
        // Parallel planes: either disjoint or coplanar overlap.
        let dist = plane1.signed_distance(&plane2.origin());
        if dist.abs() <= tol.point {
            coplanar_overlap(mesh, s1, s2, tol, set);
            return IntersectionClass::Coplanar;
        }
        return IntersectionClass::Miss;
    }

    let dir = dir.normalize();

    // Candidate points on the common line: where one side's boundary crosses
    // the other side's plane, inside the other polygon.
    let mut candidates: Vec<Point<Real>> = Vec::new();
    boundary_plane_hits(mesh, s2, &plane1, s1, tol, &mut candidates);
    boundary_plane_hits(mesh, s1, &plane2, s2, tol, &mut candidates);

    if candidates.len() < 2 {
        return if candidates.is_empty() {
            IntersectionClass::Miss
        } else {
            IntersectionClass::TouchPoint
        };
    }

    let params: Vec<Real> = candidates.iter().map(|p| dir.dot(&p.coords)).collect();
    let (mut lo, mut hi) = (0, 0);
    for (i, s) in params.iter().enumerate() {
        if *s < params[lo] {
            lo = i;
        }
        if *s > params[hi] {
            hi = i;
        }
    }

    if params[hi] - params[lo] <= tol.point {
        // The overlap degenerates to a touching point.
        let id = mesh.insert_point(candidates[lo]);
        set.push_point(s1, id);
        set.push_point(s2, id);
        return IntersectionClass::TouchPoint;
    }

    let a = mesh.insert_point(candidates[lo]);
    let b = mesh.insert_point(candidates[hi]);
    set.push_segment(a, b, &[s1, s2]);
    IntersectionClass::Cut
}

/// Collects the points where the boundary of `of` crosses `plane`, keeping
/// those inside the polygon `inside`.
fn boundary_plane_hits(
    mesh: &CutMesh,
    of: SideId,
    plane: &Plane,
    inside: SideId,
    tol: &Tolerances,
    out: &mut Vec<Point<Real>>,
) {
    let pts = mesh.side(of).points.clone();
    let n = pts.len();

    for i in 0..n {
        let p = mesh.point(pts[i]);
        let q = mesh.point(pts[(i + 1) % n]);
        let d0 = plane.signed_distance(&p);
        let d1 = plane.signed_distance(&q);

        if d0.abs() <= tol.point && d1.abs() <= tol.point {
            // Boundary edge lying in the plane contributes both endpoints.
            for hit in [p, q] {
                if point_in_side(mesh, inside, &hit, tol.point) {
                    out.push(hit);
                }
            }
        } else if d0.abs() <= tol.point {
            if point_in_side(mesh, inside, &p, tol.point) {
                out.push(p);
            }
        } else if (d0 > 0.0) != (d1 > 0.0) {
            let t = d0 / (d0 - d1);
            let hit = p + (q - p) * t;
            if point_in_side(mesh, inside, &hit, tol.point) {
                out.push(hit);
            }
        }
    }
}

/// Registers the 2D overlap polygon of two coplanar sides.
///
/// The clipped polygon's edges become intersection segments carried by both
/// sides, so both PSLGs see the shared region.
fn coplanar_overlap(
    mesh: &mut CutMesh,
    s1: SideId,
    s2: SideId,
    tol: &Tolerances,
    set: &mut IntersectionSet,
) {
    let plane = mesh.side(s1).plane;
    let poly1: Vec<Point2<Real>> = mesh.side(s1).points.iter().map(|p| plane.project2d(&mesh.point(*p))).collect();
    let poly2: Vec<Point2<Real>> = mesh.side(s2).points.iter().map(|p| plane.project2d(&mesh.point(*p))).collect();

    let clipped = clip_convex_polygons(&poly1, &poly2);
    if clipped.len() < 3 {
        return;
    }

    let ids: Vec<PointId> = clipped
        .iter()
        .map(|p| mesh.insert_point(plane.unproject(p)))
        .collect();

    for i in 0..ids.len() {
        let a = ids[i];
        let b = ids[(i + 1) % ids.len()];
        let len = (mesh.point(a) - mesh.point(b)).norm();
        if len > tol.point {
            set.push_segment(a, b, &[s1, s2]);
        }
    }
}

/// Sutherland–Hodgman clipping of convex `subject` against convex `clip`.
fn clip_convex_polygons(subject: &[Point2<Real>], clip: &[Point2<Real>]) -> Vec<Point2<Real>> {
    // Ensure the clip polygon is counterclockwise.
    let mut area = 0.0;
    for i in 0..clip.len() {
        let a = clip[i];
        let b = clip[(i + 1) % clip.len()];
        area += a.x * b.y - b.x * a.y;
    }
    let ccw = area >= 0.0;

    let mut output: Vec<Point2<Real>> = subject.to_vec();

    for i in 0..clip.len() {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % clip.len()];
        let edge = if ccw { (a, b) } else { (b, a) };

        let input = std::mem::take(&mut output);
        let inside = |p: &Point2<Real>| {
            (edge.1.x - edge.0.x) * (p.y - edge.0.y) - (edge.1.y - edge.0.y) * (p.x - edge.0.x)
                >= 0.0
        };

        for j in 0..input.len() {
            let cur = input[j];
            let prev = input[(j + input.len() - 1) % input.len()];
            let cur_in = inside(&cur);
            let prev_in = inside(&prev);

            if cur_in != prev_in {
                let d = cur - prev;
                let num = (edge.1.x - edge.0.x) * (prev.y - edge.0.y)
                    - (edge.1.y - edge.0.y) * (prev.x - edge.0.x);
                let den = (edge.1.x - edge.0.x) * d.y - (edge.1.y - edge.0.y) * d.x;
                if den != 0.0 {
                    let t = -num / den;
                    output.push(prev + d * t);
                }
            }
            if cur_in {
                output.push(cur);
            }
        }
    }

    output
}

/// True when `p` lies on the polygon of `side`, within `eps`, including its
/// boundary.
fn point_in_side(mesh: &CutMesh, side: SideId, p: &Point<Real>, eps: Real) -> bool {
    let plane = mesh.side(side).plane;
    if plane.signed_distance(p).abs() > eps.max(1.0e-9) {
        return false;
    }

    let pt = plane.project2d(p);
    let poly: Vec<Point2<Real>> = mesh
        .side(side)
        .points
        .iter()
        .map(|q| plane.project2d(&mesh.point(*q)))
        .collect();

    point_in_convex_poly2d_eps(&pt, &poly, eps)
}

/// Convex point-in-polygon with an absolute tolerance: points within `eps`
/// outside an edge still count as inside.
fn point_in_convex_poly2d_eps(pt: &Point2<Real>, poly: &[Point2<Real>], eps: Real) -> bool {
    if poly.len() < 3 {
        return false;
    }

    // Establish the polygon winding from its signed area.
    let mut area = 0.0;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        area += a.x * b.y - b.x * a.y;
    }
    let sign = if area >= 0.0 { 1.0 } else { -1.0 };

    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let seg = b - a;
        let len = seg.norm();
        if len == 0.0 {
            continue;
        }
        let perp = sign * (seg.x * (pt.y - a.y) - seg.y * (pt.x - a.x)) / len;
        if perp < -eps {
            return false;
        }
    }
    true
}

/// Splits segments that cross each other inside a shared side, so the facet
/// PSLGs only ever receive non-crossing constraints.
fn split_crossing_segments(mesh: &mut CutMesh, set: &mut IntersectionSet, tol: &Tolerances) {
    use crate::utils::{segments_intersection2d, SegmentsIntersection};

    let side_count = mesh.side_count();
    for side_idx in 0..side_count {
        let side = SideId(side_idx as u32);
        let plane = mesh.side(side).plane;

        loop {
            let on_side: Vec<usize> = set
                .segments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.sides.contains(&side))
                .map(|(i, _)| i)
                .collect();

            let mut split: Option<(usize, usize, Point2<Real>)> = None;

            'outer: for (k, &i) in on_side.iter().enumerate() {
                for &j in on_side.iter().skip(k + 1) {
                    let (ia, ib) = (set.segments[i].a, set.segments[i].b);
                    let (ja, jb) = (set.segments[j].a, set.segments[j].b);
                    if ia == ja || ia == jb || ib == ja || ib == jb {
                        continue;
                    }
                    let a = plane.project2d(&mesh.point(ia));
                    let b = plane.project2d(&mesh.point(ib));
                    let c = plane.project2d(&mesh.point(ja));
                    let d = plane.project2d(&mesh.point(jb));

                    if let Some(SegmentsIntersection::Point { loc1, loc2 }) =
                        segments_intersection2d(&a, &b, &c, &d, tol.point.max(1.0e-12))
                    {
                        use crate::utils::SegmentPointLocation::OnEdge;
                        if let (OnEdge(s), OnEdge(_)) = (loc1, loc2) {
                            let hit = a + (b - a) * s;
                            split = Some((i, j, hit));
                            break 'outer;
                        }
                    }
                }
            }

            match split {
                None => break,
                Some((i, j, hit2d)) => {
                    let hit = plane.unproject(&hit2d);
                    let id = mesh.insert_point(hit);
                    set.push_point(side, id);
                    for seg_idx in [i, j] {
                        let seg = set.segments[seg_idx].clone();
                        if seg.a == id || seg.b == id {
                            continue;
                        }
                        set.segments[seg_idx].b = id;
                        set.segments.push(CutSegment {
                            a: id,
                            b: seg.b,
                            sides: seg.sides.clone(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;
    use crate::topology::{CutMesh, SideKind};

    fn tri_side(mesh: &mut CutMesh, id: u32, pts: [[Real; 3]; 3]) -> SideId {
        let ids: Vec<_> = pts
            .iter()
            .map(|p| mesh.insert_point(Point::new(p[0], p[1], p[2])))
            .collect();
        mesh.add_side(SideKind::Cut { external_id: id }, ids).unwrap()
    }

    #[test]
    fn edge_pierces_triangle() {
        let mut mesh = CutMesh::new(1.0e-12);
        let side = tri_side(
            &mut mesh,
            1,
            [[0.0, 0.0, 0.5], [2.0, 0.0, 0.5], [0.0, 2.0, 0.5]],
        );

        let a = mesh.insert_point(Point::new(0.4, 0.4, 0.0));
        let b = mesh.insert_point(Point::new(0.4, 0.4, 1.0));
        let edge = mesh.add_edge(a, b);

        let tol = Tolerances {
            point: 1.0e-12,
            param: 1.0e-12,
        };
        let mut set = IntersectionSet::default();
        let class = intersect_edge_side(&mut mesh, edge, side, &tol, &mut set);
        assert_eq!(class, IntersectionClass::Cut);

        let cuts: Vec<_> = mesh.edge(edge).cuts().collect();
        assert_eq!(cuts.len(), 1);
        assert_relative_eq!(cuts[0].0, 0.5, epsilon = 1.0e-12);
        let hit = mesh.point(cuts[0].1);
        assert_relative_eq!(hit.z, 0.5, epsilon = 1.0e-12);
    }

    #[test]
    fn edge_touching_at_endpoint_snaps() {
        let mut mesh = CutMesh::new(1.0e-12);
        let side = tri_side(
            &mut mesh,
            1,
            [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
        );

        let a = mesh.insert_point(Point::new(0.4, 0.4, 0.0));
        let b = mesh.insert_point(Point::new(0.4, 0.4, 1.0));
        let edge = mesh.add_edge(a, b);

        let tol = Tolerances {
            point: 1.0e-12,
            param: 1.0e-12,
        };
        let mut set = IntersectionSet::default();
        let class = intersect_edge_side(&mut mesh, edge, side, &tol, &mut set);
        assert_eq!(class, IntersectionClass::TouchPoint);
        assert_eq!(mesh.edge(edge).cuts().count(), 0);
        assert_eq!(set.points_on(side).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn crossing_quads_produce_shared_segment() {
        let mut mesh = CutMesh::new(1.0e-12);
        // Vertical quad x = 0.5 and horizontal quad z = 0.5 crossing inside
        // the unit cube.
        let q1: Vec<_> = [
            [0.5, -0.5, -0.5],
            [0.5, 1.5, -0.5],
            [0.5, 1.5, 1.5],
            [0.5, -0.5, 1.5],
        ]
        .iter()
        .map(|p| mesh.insert_point(Point::new(p[0], p[1], p[2])))
        .collect();
        let s1 = mesh.add_side(SideKind::Cut { external_id: 1 }, q1).unwrap();

        let q2: Vec<_> = [
            [-0.5, 0.0, 0.5],
            [1.5, 0.0, 0.5],
            [1.5, 1.0, 0.5],
            [-0.5, 1.0, 0.5],
        ]
        .iter()
        .map(|p| mesh.insert_point(Point::new(p[0], p[1], p[2])))
        .collect();
        let s2 = mesh.add_side(SideKind::Cut { external_id: 2 }, q2).unwrap();

        let tol = Tolerances {
            point: 1.0e-12,
            param: 1.0e-12,
        };
        let mut set = IntersectionSet::default();
        let class = intersect_side_pair(&mut mesh, s1, s2, &tol, &mut set);
        assert_eq!(class, IntersectionClass::Cut);
        assert_eq!(set.segments.len(), 1);

        let seg = &set.segments[0];
        let a = mesh.point(seg.a);
        let b = mesh.point(seg.b);
        // The common line is x = 0.5, z = 0.5, clipped to y ∈ [0, 1].
        for p in [a, b] {
            assert_relative_eq!(p.x, 0.5, epsilon = 1.0e-12);
            assert_relative_eq!(p.z, 0.5, epsilon = 1.0e-12);
        }
        assert_relative_eq!((a - b).norm(), 1.0, epsilon = 1.0e-10);
    }

    #[test]
    fn parallel_sides_miss() {
        let mut mesh = CutMesh::new(1.0e-12);
        let s1 = tri_side(
            &mut mesh,
            1,
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        let s2 = tri_side(
            &mut mesh,
            2,
            [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
        );

        let tol = Tolerances {
            point: 1.0e-12,
            param: 1.0e-12,
        };
        let mut set = IntersectionSet::default();
        assert_eq!(
            intersect_side_pair(&mut mesh, s1, s2, &tol, &mut set),
            IntersectionClass::Miss
        );
    }
}
