//! The facet builder.
//!
//! Splits every side (element faces and cut sides) along the intersection
//! points and polylines produced by the kernel, and extracts the maximal
//! planar regions that lie inside the background element. Each side is
//! overlaid as a planar straight-line graph and triangulated with a
//! constrained Delaunay triangulation; triangles are then grouped across
//! non-constraint edges into facets.

use crate::intersect::{IntersectionSet, Tolerances};
use crate::math::{Point, Point2, Real};
use crate::pool::PointId;
use crate::predicates::Plane;
use crate::session::CutError;
use crate::topology::{CutMesh, Facet, FacetFlags, SideId};
use crate::utils::{sanitize_spade_point, SortedPair};
use ena::unify::{InPlaceUnificationTable, UnifyKey};
use smallvec::SmallVec;
use spade::{ConstrainedDelaunayTriangulation, Triangulation as _};
use std::collections::{HashMap, HashSet};

/// The convex shell of the background element: its outward-oriented face
/// planes and the corresponding element sides.
#[derive(Clone, Debug)]
pub struct ElementShell {
    /// Outward-oriented planes, one per element side (same order as `sides`).
    pub planes: Vec<Plane>,
    /// The element sides.
    pub sides: Vec<SideId>,
}

impl ElementShell {
    /// True when `p` is inside the element, within `eps` (boundary included
    /// for positive `eps`).
    pub fn contains(&self, p: &Point<Real>, eps: Real) -> bool {
        self.planes.iter().all(|pl| pl.signed_distance(p) <= eps)
    }

    /// True when `p` lies on the element boundary within `eps`.
    pub fn on_boundary(&self, p: &Point<Real>, eps: Real) -> bool {
        self.contains(p, eps) && self.planes.iter().any(|pl| pl.signed_distance(p).abs() <= eps)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct FaceKey(u32);

impl UnifyKey for FaceKey {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        FaceKey(u)
    }

    fn tag() -> &'static str {
        "FaceKey"
    }
}

/// Builds the facets of every side of the mesh.
///
/// Element sides keep all of their regions (they lie on the element boundary
/// by construction); cut side regions outside the element are discarded, and
/// cut side regions lying *on* the element boundary are merged into the
/// corresponding element-side facet (`COPLANAR`).
pub fn build_facets(
    mesh: &mut CutMesh,
    shell: &ElementShell,
    cut_sides: &[SideId],
    set: &IntersectionSet,
    tol: &Tolerances,
    level_set: bool,
) -> Result<(), CutError> {
    for &side in shell.sides.iter() {
        build_side_facets(mesh, shell, side, set, tol, level_set)?;
    }
    for &side in cut_sides {
        build_side_facets(mesh, shell, side, set, tol, level_set)?;
    }

    // Mark element-side facets covered by a coplanar cut side.
    mark_coplanar_facets(mesh, shell, cut_sides, tol);

    log::debug!("facet builder: {} facets", mesh.facet_count());
    Ok(())
}

fn build_side_facets(
    mesh: &mut CutMesh,
    shell: &ElementShell,
    side: SideId,
    set: &IntersectionSet,
    tol: &Tolerances,
    level_set: bool,
) -> Result<(), CutError> {
    let plane = mesh.side(side).plane;
    let is_cut = mesh.side(side).is_cut_side();

    // Level-set patches are built directly from their (possibly non-planar)
    // fan triangulation: they lie inside the element by construction and the
    // face-contour segments already split the element sides.
    if is_cut && level_set {
        let tris = mesh.side(side).tris.clone();
        let ring = mesh.side(side).points.clone();
        let _ = mesh.add_facet(Facet {
            side,
            ring,
            tris,
            plane,
            flags: FacetFlags::ON_CUT_SIDE | FacetFlags::LEVEL_SET,
            cut_source: Some(side),
            cells: [None, None],
        });
        return Ok(());
    }

    // 1. Collect the PSLG: boundary sub-edges plus intersection segments plus
    //    isolated points.
    let mut vertices: Vec<PointId> = Vec::new();
    let mut constraints: Vec<(PointId, PointId)> = Vec::new();

    let side_edges = mesh.side(side).edges.clone();
    for e in side_edges {
        let pts = mesh.edge(e).split_points();
        for pair in pts.windows(2) {
            constraints.push((pair[0], pair[1]));
        }
    }

    for seg in set.segments_on(side) {
        constraints.push((seg.a, seg.b));
    }

    for p in set.points_on(side) {
        vertices.push(p);
    }
    for (a, b) in &constraints {
        vertices.push(*a);
        vertices.push(*b);
    }
    vertices.sort_unstable();
    vertices.dedup();

    // 2. Split constraints at vertices lying on them, then deduplicate, so
    //    collinear overlapping constraints collapse to identical pieces.
    let project = |mesh: &CutMesh, p: PointId| plane.project2d(&mesh.point(p));
    let coords2d: HashMap<PointId, Point2<Real>> = vertices
        .iter()
        .map(|p| (*p, project(mesh, *p)))
        .collect();

    let mut final_constraints: HashSet<SortedPair<PointId>> = HashSet::new();
    for (a, b) in constraints {
        if a == b {
            continue;
        }
        let pa = coords2d[&a];
        let pb = coords2d[&b];
        let dir = pb - pa;
        let len2 = dir.norm_squared();
        if len2 == 0.0 {
            continue;
        }

        // Interior vertices on this constraint, in parametric order.
        let mut on_seg: Vec<(Real, PointId)> = Vec::new();
        for v in &vertices {
            if *v == a || *v == b {
                continue;
            }
            let pv = coords2d[v];
            let t = (pv - pa).dot(&dir) / len2;
            if t <= 0.0 || t >= 1.0 {
                continue;
            }
            let foot = pa + dir * t;
            if (pv - foot).norm() <= tol.point.max(1.0e-12) {
                on_seg.push((t, *v));
            }
        }
        on_seg.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut prev = a;
        for (_, v) in on_seg {
            if v != prev {
                let _ = final_constraints.insert(SortedPair::new(prev, v));
            }
            prev = v;
        }
        if prev != b {
            let _ = final_constraints.insert(SortedPair::new(prev, b));
        }
    }

    // 3. Constrained triangulation of the overlay.
    let mut cdt: ConstrainedDelaunayTriangulation<spade::Point2<Real>> =
        ConstrainedDelaunayTriangulation::new();
    let mut handle_of: HashMap<PointId, spade::handles::FixedVertexHandle> = HashMap::new();
    let mut point_of: HashMap<usize, PointId> = HashMap::new();

    for v in &vertices {
        let p2 = coords2d[v];
        let handle = cdt
            .insert(sanitize_spade_point(spade::Point2::new(p2.x, p2.y)))
            .map_err(|_| CutError::degenerate_side(side))?;
        let _ = handle_of.insert(*v, handle);
        let _ = point_of.entry(handle.index()).or_insert(*v);
    }

    // Constraints go in sorted order: the triangulation of cocircular point
    // sets depends on insertion order, and runs must be reproducible.
    let mut sorted_constraints: Vec<SortedPair<PointId>> = final_constraints.into_iter().collect();
    sorted_constraints.sort_unstable();

    let mut constraint_pairs: HashSet<SortedPair<PointId>> = HashSet::new();
    for pair in &sorted_constraints {
        let (a, b) = **pair;
        let (ha, hb) = (handle_of[&a], handle_of[&b]);
        if ha != hb {
            let _ = cdt.add_constraint(ha, hb);
            let _ = constraint_pairs.insert(SortedPair::new(a, b));
        }
    }

    // 4. Accept faces: map back to 3D and drop what lies outside the element
    //    (or duplicates an element-side region, for cut sides).
    let mut faces: Vec<[PointId; 3]> = Vec::new();
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        let mut tri = [PointId(0); 3];
        let mut ok = true;
        for (k, v) in vs.iter().enumerate() {
            match point_of.get(&v.fix().index()) {
                Some(p) => tri[k] = *p,
                None => ok = false,
            }
        }
        if !ok {
            continue;
        }

        let centroid2 = {
            let [a, b, c] = tri.map(|p| coords2d[&p]);
            Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
        };
        let centroid = plane.unproject(&centroid2);

        // Degenerate slivers contribute nothing.
        let area = {
            let [a, b, c] = tri.map(|p| coords2d[&p]);
            ((b - a).perp(&(c - a)) * 0.5).abs()
        };
        if area <= tol.point * tol.point {
            continue;
        }

        if is_cut {
            if !shell.contains(&centroid, tol.point) {
                continue;
            }
            // A region on the element boundary is represented by the matching
            // element-side facet instead.
            if shell.on_boundary(&centroid, tol.point) {
                continue;
            }
        }

        faces.push(tri);
    }

    if faces.is_empty() {
        return Ok(());
    }

    // 5. Group faces into maximal regions across non-constraint edges.
    let mut table: InPlaceUnificationTable<FaceKey> = InPlaceUnificationTable::new();
    let keys: Vec<FaceKey> = faces.iter().map(|_| table.new_key(())).collect();

    let mut edge_faces: HashMap<SortedPair<PointId>, SmallVec<[usize; 2]>> = HashMap::new();
    for (fi, tri) in faces.iter().enumerate() {
        for k in 0..3 {
            let pair = SortedPair::new(tri[k], tri[(k + 1) % 3]);
            edge_faces.entry(pair).or_default().push(fi);
        }
    }

    for (pair, incident) in &edge_faces {
        if constraint_pairs.contains(pair) {
            continue;
        }
        if incident.len() == 2 {
            let _ = table.union(keys[incident[0]], keys[incident[1]]);
        }
    }

    let mut regions: HashMap<u32, Vec<usize>> = HashMap::new();
    for (fi, key) in keys.iter().enumerate() {
        regions.entry(table.find(*key).0).or_default().push(fi);
    }

    // Deterministic region order: by smallest contained face index.
    let mut region_list: Vec<Vec<usize>> = regions.into_values().collect();
    region_list.sort_by_key(|r| r.iter().copied().min());

    // 6. Create one facet per region.
    let flags = if is_cut {
        if level_set {
            FacetFlags::ON_CUT_SIDE | FacetFlags::LEVEL_SET
        } else {
            FacetFlags::ON_CUT_SIDE
        }
    } else {
        FacetFlags::ON_ELEMENT_SIDE
    };

    for region in region_list {
        let tris: Vec<[PointId; 3]> = region.iter().map(|fi| faces[*fi]).collect();
        let ring = extract_ring(&tris);

        let _ = mesh.add_facet(Facet {
            side,
            ring,
            tris,
            plane,
            flags,
            cut_source: if is_cut { Some(side) } else { None },
            cells: [None, None],
        });
    }

    Ok(())
}

/// Chains the boundary edges of a triangle region into a loop.
///
/// Returns an empty ring when the region is not simple (holes, pinch
/// points); the triangles still fully describe the facet.
fn extract_ring(tris: &[[PointId; 3]]) -> Vec<PointId> {
    let mut boundary: HashMap<PointId, SmallVec<[PointId; 2]>> = HashMap::new();
    let mut edge_count: HashMap<SortedPair<PointId>, usize> = HashMap::new();

    for tri in tris {
        for k in 0..3 {
            *edge_count
                .entry(SortedPair::new(tri[k], tri[(k + 1) % 3]))
                .or_insert(0) += 1;
        }
    }

    for tri in tris {
        for k in 0..3 {
            let a = tri[k];
            let b = tri[(k + 1) % 3];
            if edge_count[&SortedPair::new(a, b)] == 1 {
                boundary.entry(a).or_default().push(b);
            }
        }
    }

    let start = match boundary.keys().min() {
        Some(s) => *s,
        None => return Vec::new(),
    };

    let mut ring = vec![start];
    let mut current = start;
    loop {
        let nexts = match boundary.get(&current) {
            Some(n) if n.len() == 1 => n[0],
            _ => return Vec::new(),
        };
        if nexts == start {
            break;
        }
        if ring.contains(&nexts) || ring.len() > boundary.len() {
            return Vec::new();
        }
        ring.push(nexts);
        current = nexts;
    }

    ring
}

/// Flags element-side facets whose region is covered by a coplanar cut side.
fn mark_coplanar_facets(
    mesh: &mut CutMesh,
    shell: &ElementShell,
    cut_sides: &[SideId],
    tol: &Tolerances,
) {
    let mut coplanar: Vec<(SideId, SideId)> = Vec::new();
    for (i, &elem) in shell.sides.iter().enumerate() {
        for &cut in cut_sides {
            let cn = mesh.side(cut).plane.normal;
            let en = shell.planes[i].normal;
            if cn.cross(&en).norm() <= 1.0e-10 {
                let dist = shell.planes[i]
                    .signed_distance(&mesh.side(cut).plane.origin());
                if dist.abs() <= tol.point {
                    coplanar.push((elem, cut));
                }
            }
        }
    }

    if coplanar.is_empty() {
        return;
    }

    let facet_count = mesh.facet_count();
    for fi in 0..facet_count {
        let facet_id = crate::topology::FacetId(fi as u32);
        let facet_side = mesh.facet(facet_id).side;
        for (elem, cut) in &coplanar {
            if facet_side != *elem {
                continue;
            }
            // Representative interior point of the facet.
            let tri = mesh.facet(facet_id).tris[0];
            let centroid = Point::from(
                (mesh.point(tri[0]).coords + mesh.point(tri[1]).coords + mesh.point(tri[2]).coords)
                    / 3.0,
            );
            if point_in_side_polygon(mesh, *cut, &centroid, tol.point) {
                let cut = *cut;
                let facet = mesh.facet_mut(facet_id);
                facet.flags |= FacetFlags::ON_CUT_SIDE | FacetFlags::COPLANAR;
                facet.cut_source = Some(cut);
            }
        }
    }
}

fn point_in_side_polygon(mesh: &CutMesh, side: SideId, p: &Point<Real>, eps: Real) -> bool {
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
    crate::utils::point_in_poly2d(&pt, &poly)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::intersect::Tolerances;
    use crate::math::Point;
    use crate::topology::{CutMesh, SideKind};

    /// One square side with one crossing segment must split into two facets.
    #[test]
    fn side_split_by_segment() {
        let mut mesh = CutMesh::new(1.0e-12);

        let corners: Vec<_> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
        .iter()
        .map(|p| mesh.insert_point(Point::new(p[0], p[1], p[2])))
        .collect();
        let side = mesh
            .add_side(SideKind::Element { face: 0 }, corners.clone())
            .unwrap();

        // Split the bottom and top boundary edges at x = 0.5 and join them.
        let bot = mesh.insert_point(Point::new(0.5, 0.0, 0.0));
        let top = mesh.insert_point(Point::new(0.5, 1.0, 0.0));
        let e_bot = mesh.edge_between(corners[0], corners[1]).unwrap();
        let e_top = mesh.edge_between(corners[2], corners[3]).unwrap();
        mesh.edge_mut(e_bot).add_cut(0.5, bot);
        mesh.edge_mut(e_top).add_cut(0.5, top);

        let mut set = IntersectionSet::default();
        set.segments.push(crate::intersect::CutSegment {
            a: bot,
            b: top,
            sides: smallvec::smallvec![side],
        });

        // A dummy all-accepting shell around the square.
        let shell = ElementShell {
            planes: Vec::new(),
            sides: vec![side],
        };

        let tol = Tolerances {
            point: 1.0e-12,
            param: 1.0e-12,
        };
        build_facets(&mut mesh, &shell, &[], &set, &tol, false).unwrap();

        assert_eq!(mesh.facet_count(), 2);
        for (_, facet) in mesh.facets() {
            // Each half is a rectangle: two CDT triangles each.
            assert_eq!(facet.tris.len(), 2);
            assert_eq!(facet.ring.len(), 4);
        }
    }
}
