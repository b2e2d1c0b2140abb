//! Level-set cut fronts.
//!
//! For level-set elements the cut surface is the zero isocontour of the nodal
//! field interpolated over the element. No generic intersection pass is
//! needed: restricted to an element edge the interpolant is linear, so edge
//! cut points are exact; on each face the (bi)linear zero-contour pairs the
//! face's cut points into segments; chaining the segments yields closed loops
//! that become the internal cut facets, oriented towards the positive side of
//! the field.

use crate::intersect::{IntersectionSet, Tolerances};
use crate::math::{Point, Real, Vector};
use crate::pool::PointId;
use crate::session::CutError;
use crate::shape::{interpolate_gradient, local_coordinates, CellType};
use crate::topology::{CutMesh, EdgeId, SideId, SideKind};
use crate::utils::SortedPair;
use std::collections::HashMap;

/// The synthetic external side id carried by level-set cut facets.
pub const LEVEL_SET_SIDE_ID: u32 = u32::MAX;

/// Builds the level-set front of one element and registers its face-contour
/// segments in the intersection set.
///
/// Returns the synthetic cut sides (one per closed contour loop).
pub fn build_level_set_front(
    mesh: &mut CutMesh,
    shape: CellType,
    corner_ids: &[PointId],
    element_edges: &[EdgeId],
    element_sides: &[SideId],
    values: &[Real],
    set: &mut IntersectionSet,
    tol: &Tolerances,
) -> Result<Vec<SideId>, CutError> {
    let shape = shape.linearized();
    let edges = shape.edges();
    let faces = shape.faces();

    // 1. Edge cut points: the field is linear along every element edge.
    let mut edge_cut: Vec<Option<PointId>> = vec![None; edges.len()];
    for (le, [i, j]) in edges.iter().enumerate() {
        let (vi, vj) = (values[*i], values[*j]);
        if vi == 0.0 || vj == 0.0 || vi.signum() == vj.signum() {
            continue;
        }
        let t = vi / (vi - vj);
        let pi = mesh.point(corner_ids[*i]);
        let pj = mesh.point(corner_ids[*j]);
        let hit = pi + (pj - pi) * t;
        let id = mesh.insert_point(hit);

        // Register on the edge entity, minding its own end order.
        let entity = element_edges[le];
        let ends = mesh.edge(entity).ends();
        let param = if ends[0] == corner_ids[*i] { t } else { 1.0 - t };
        mesh.edge_mut(entity).add_cut(param, id);
        edge_cut[le] = Some(id);
    }

    // 2. Per-face contour segments.
    let mut segments: Vec<(PointId, PointId)> = Vec::new();
    for (lf, face) in faces.iter().enumerate() {
        let n = face.len();

        // Contour points around the face, keyed by the corner that follows
        // them (cut on edge (k, k+1) is stored at slot k), plus on-surface
        // corners.
        let mut slot: Vec<Option<PointId>> = vec![None; n];
        let mut corner_on_surface: Vec<Option<PointId>> = vec![None; n];
        let mut count = 0;

        for k in 0..n {
            let (a, b) = (face[k], face[(k + 1) % n]);
            if let Some(le) = local_edge_index(edges, a, b) {
                if let Some(p) = edge_cut[le] {
                    slot[k] = Some(p);
                    count += 1;
                }
            }
            if values[face[k]] == 0.0 {
                corner_on_surface[k] = Some(corner_ids[face[k]]);
            }
        }

        let face_side = element_sides[lf];
        let mut push = |set: &mut IntersectionSet, a: PointId, b: PointId| {
            if a != b {
                let seg = crate::intersect::CutSegment {
                    a,
                    b,
                    sides: smallvec::smallvec![face_side],
                };
                set.segments.push(seg);
                set.points_on_side.push((face_side, a));
                set.points_on_side.push((face_side, b));
                segments.push((a, b));
            }
        };

        let on_surface: Vec<PointId> = corner_on_surface.iter().flatten().copied().collect();

        match (count, on_surface.len()) {
            (0, 0) | (0, 1) => {}
            (0, 2) => {
                // The contour runs along or through two corners; a segment
                // exists only if the face is actually crossed, i.e. the
                // remaining corners have both signs.
                let mut pos = false;
                let mut neg = false;
                for k in 0..n {
                    let v = values[face[k]];
                    pos |= v > 0.0;
                    neg |= v < 0.0;
                }
                if pos && neg {
                    push(set, on_surface[0], on_surface[1]);
                }
            }
            (2, 0) => {
                let pts: Vec<PointId> = slot.iter().flatten().copied().collect();
                push(set, pts[0], pts[1]);
            }
            (1, 1) => {
                let p = slot.iter().flatten().next().copied();
                if let Some(p) = p {
                    push(set, p, on_surface[0]);
                }
            }
            (4, 0) => {
                // Saddle face: decide the pairing with the face-center value.
                let center: Real =
                    face.iter().map(|k| values[*k]).sum::<Real>() / n as Real;
                // Cut off every corner whose sign differs from the center.
                for k in 0..n {
                    let v = values[face[k]];
                    let opposite = (v > 0.0) != (center > 0.0);
                    if opposite {
                        let before = slot[(k + n - 1) % n];
                        let after = slot[k];
                        if let (Some(a), Some(b)) = (before, after) {
                            push(set, a, b);
                        }
                    }
                }
            }
            _ => {
                return Err(CutError::degenerate_intersection(format!(
                    "unsupported level-set face pattern: {} cuts, {} surface corners",
                    count,
                    on_surface.len()
                )));
            }
        }
    }

    if segments.is_empty() {
        return Ok(Vec::new());
    }

    // 3. Chain segments into closed loops.
    let loops = chain_loops(&segments)
        .ok_or_else(|| CutError::degenerate_intersection("open level-set contour".to_owned()))?;

    // 4. One synthetic cut side per loop, oriented towards the positive side.
    let mut out = Vec::new();
    for mut ring in loops {
        orient_ring_towards_gradient(mesh, shape, corner_ids, values, &mut ring);

        let side = if ring.len() <= 4 && ring_planar(mesh, &ring, tol.point) {
            mesh.add_side(SideKind::Cut { external_id: LEVEL_SET_SIDE_ID }, ring)
        } else {
            let centroid = ring_centroid(mesh, &ring);
            let center = mesh.insert_point(centroid);
            mesh.add_fan_side(SideKind::Cut { external_id: LEVEL_SET_SIDE_ID }, ring, center)
        };

        match side {
            Some(side) => out.push(side),
            None => {
                return Err(CutError::degenerate_intersection(
                    "degenerate level-set contour loop".to_owned(),
                ))
            }
        }
    }

    log::debug!("level-set front: {} loop(s)", out.len());
    Ok(out)
}

fn local_edge_index(edges: &[[usize; 2]], a: usize, b: usize) -> Option<usize> {
    edges
        .iter()
        .position(|[i, j]| (*i == a && *j == b) || (*i == b && *j == a))
}

/// Chains undirected segments into closed loops; `None` when a vertex does
/// not have exactly two incident segments.
fn chain_loops(segments: &[(PointId, PointId)]) -> Option<Vec<Vec<PointId>>> {
    let mut adjacency: HashMap<PointId, Vec<PointId>> = HashMap::new();
    let mut seen: Vec<SortedPair<PointId>> = Vec::new();
    for (a, b) in segments {
        let pair = SortedPair::new(*a, *b);
        if seen.contains(&pair) {
            continue;
        }
        seen.push(pair);
        adjacency.entry(*a).or_default().push(*b);
        adjacency.entry(*b).or_default().push(*a);
    }

    for neighbors in adjacency.values() {
        if neighbors.len() != 2 {
            return None;
        }
    }

    let mut visited: Vec<PointId> = Vec::new();
    let mut loops = Vec::new();

    let mut starts: Vec<PointId> = adjacency.keys().copied().collect();
    starts.sort_unstable();

    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut ring = vec![start];
        visited.push(start);
        let mut prev = start;
        let mut current = adjacency[&start][0];

        while current != start {
            ring.push(current);
            visited.push(current);
            let nbrs = &adjacency[&current];
            let next = if nbrs[0] == prev { nbrs[1] } else { nbrs[0] };
            prev = current;
            current = next;
            if ring.len() > adjacency.len() {
                return None;
            }
        }
        loops.push(ring);
    }

    Some(loops)
}

fn ring_centroid(mesh: &CutMesh, ring: &[PointId]) -> Point<Real> {
    let mut acc = Vector::zeros();
    for p in ring {
        acc += mesh.point(*p).coords;
    }
    Point::from(acc / ring.len() as Real)
}

fn ring_planar(mesh: &CutMesh, ring: &[PointId], eps: Real) -> bool {
    let coords: Vec<Point<Real>> = ring.iter().map(|p| mesh.point(*p)).collect();
    match crate::predicates::Plane::from_points(&coords) {
        Some(plane) => plane.max_deviation(&coords) <= eps.max(1.0e-9),
        None => false,
    }
}

/// Reverses the ring when its Newell normal points towards the negative side
/// of the level-set field.
fn orient_ring_towards_gradient(
    mesh: &CutMesh,
    shape: CellType,
    corner_ids: &[PointId],
    values: &[Real],
    ring: &mut Vec<PointId>,
) {
    let coords: Vec<Point<Real>> = ring.iter().map(|p| mesh.point(*p)).collect();
    let plane = match crate::predicates::Plane::from_points(&coords) {
        Some(plane) => plane,
        None => return,
    };

    let corners: Vec<Point<Real>> = corner_ids.iter().map(|p| mesh.point(*p)).collect();
    let centroid = ring_centroid(mesh, ring);

    let gradient = local_coordinates(shape, &corners, &centroid)
        .and_then(|xi| interpolate_gradient(shape, &corners, values, &xi));

    if let Some(g) = gradient {
        if plane.normal.dot(&g) < 0.0 {
            ring.reverse();
        }
    }
}
