//! The volume cell finder.
//!
//! The facets of a cut element form a 2-complex; the element interior minus
//! that complex decomposes into open regions. Regions are discovered with a
//! radial-edge flood fill: every facet contributes two half-facets, the
//! facets incident to every complex edge are sorted by dihedral angle around
//! the edge, and consecutive half-facets around the edge are unified. Each
//! resulting group of half-facets bounds exactly one volume cell (the group
//! containing the outward element boundary is the exterior and is dropped).

use crate::intersect::Tolerances;
use crate::math::{Point, Real, Vector};
use crate::pool::PointId;
use crate::session::CutError;
use crate::topology::{
    CellId, CellState, CutMesh, FacetFlags, FacetId, OrientedFacet, Position, VolumeCell,
};
use crate::utils::SortedPair;
use ena::unify::{InPlaceUnificationTable, UnifyKey};
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct HalfKey(u32);

impl UnifyKey for HalfKey {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        HalfKey(u)
    }

    fn tag() -> &'static str {
        "HalfKey"
    }
}

#[derive(Clone, Debug)]
struct EdgeIncidence {
    facet: usize,
    /// A triangle of the facet containing the edge, in facet winding.
    tri: [PointId; 3],
}

/// Discovers the volume cells of the element and links them to their facets.
///
/// Returns the created cell handles in deterministic order.
pub fn find_volume_cells(mesh: &mut CutMesh, tol: &Tolerances) -> Result<Vec<CellId>, CutError> {
    let facet_count = mesh.facet_count();
    if facet_count == 0 {
        return Ok(Vec::new());
    }

    // Half-facet keys: 2 * facet + side (0 = minus, 1 = plus), plus one
    // pseudo-key for the element exterior.
    let mut table: InPlaceUnificationTable<HalfKey> = InPlaceUnificationTable::new();
    let mut keys = Vec::with_capacity(2 * facet_count + 1);
    for _ in 0..2 * facet_count + 1 {
        keys.push(table.new_key(()));
    }
    let exterior = keys[2 * facet_count];

    // The outward-facing half of every element-side facet belongs to the
    // exterior. Element side loops are oriented outward on ingest, so the
    // plus side faces out.
    for fi in 0..facet_count {
        let facet = mesh.facet(FacetId(fi as u32));
        if facet.flags.contains(FacetFlags::ON_ELEMENT_SIDE) {
            let _ = table.union(exterior, keys[2 * fi + 1]);
        }
    }

    // Boundary sub-edges of every facet, with one incidence per facet.
    let mut incidences: HashMap<SortedPair<PointId>, Vec<EdgeIncidence>> = HashMap::new();
    for fi in 0..facet_count {
        let facet = mesh.facet(FacetId(fi as u32));

        let mut count: HashMap<SortedPair<PointId>, usize> = HashMap::new();
        for tri in &facet.tris {
            for k in 0..3 {
                *count
                    .entry(SortedPair::new(tri[k], tri[(k + 1) % 3]))
                    .or_insert(0) += 1;
            }
        }

        let mut seen: Vec<SortedPair<PointId>> = Vec::new();
        for tri in &facet.tris {
            for k in 0..3 {
                let pair = SortedPair::new(tri[k], tri[(k + 1) % 3]);
                if count[&pair] == 1 && !seen.contains(&pair) {
                    seen.push(pair);
                    incidences
                        .entry(pair)
                        .or_default()
                        .push(EdgeIncidence { facet: fi, tri: *tri });
                }
            }
        }
    }

    // Radial sort around every complex edge; consecutive half-facets bound
    // the same region.
    let mut edge_list: Vec<(&SortedPair<PointId>, &Vec<EdgeIncidence>)> =
        incidences.iter().collect();
    edge_list.sort_by_key(|(pair, _)| **pair);

    for (pair, incident) in edge_list {
        let (pa, pb) = **pair;
        let a = mesh.point(pa);
        let b = mesh.point(pb);
        let axis = match (b - a).try_normalize(0.0) {
            Some(axis) => axis,
            None => continue,
        };

        // Angular position and ccw-side of each incident facet.
        let mut entries: Vec<(OrderedFloat<Real>, usize, usize)> = Vec::new();
        let mut frame: Option<[Vector<Real>; 2]> = None;

        for inc in incident {
            let tri_pts = inc.tri.map(|p| mesh.point(p));
            let centroid =
                Point::from((tri_pts[0].coords + tri_pts[1].coords + tri_pts[2].coords) / 3.0);
            let w = centroid - a;
            let v = w - axis * w.dot(&axis);
            let v = match v.try_normalize(0.0) {
                Some(v) => v,
                None => continue,
            };
            let n = (tri_pts[1] - tri_pts[0])
                .cross(&(tri_pts[2] - tri_pts[0]))
                .normalize();

            let [e1, e2] = *frame.get_or_insert_with(|| [v, axis.cross(&v)]);
            let theta = v.dot(&e2).atan2(v.dot(&e1));

            // The side of the facet swept immediately counterclockwise of it.
            let ccw_is_plus = n.dot(&axis.cross(&v)) > 0.0;
            let ccw = usize::from(ccw_is_plus);

            entries.push((OrderedFloat(theta), inc.facet, ccw));
        }

        if entries.is_empty() {
            continue;
        }
        entries.sort();

        let k = entries.len();
        for i in 0..k {
            let j = (i + 1) % k;
            let (_, fi, ccw_i) = entries[i];
            let (_, fj, ccw_j) = entries[j];
            let _ = table.union(keys[2 * fi + ccw_i], keys[2 * fj + (1 - ccw_j)]);
        }
    }

    // Collect the groups (skipping the exterior) in deterministic order.
    let exterior_root = table.find(exterior);
    let mut groups: HashMap<u32, Vec<(usize, usize)>> = HashMap::new();
    for fi in 0..facet_count {
        for side in 0..2 {
            let root = table.find(keys[2 * fi + side]);
            if root == exterior_root {
                continue;
            }
            groups.entry(root.0).or_default().push((fi, side));
        }
    }

    let mut group_list: Vec<Vec<(usize, usize)>> = groups.into_values().collect();
    group_list.sort_by_key(|g| g.iter().map(|(fi, side)| 2 * fi + side).min());

    let mut cells = Vec::new();
    for group in group_list {
        let mut boundary: Vec<OrientedFacet> = Vec::new();
        for &(fi, side) in &group {
            boundary.push(OrientedFacet {
                facet: FacetId(fi as u32),
                cell_on_plus_side: side == 1,
            });
        }

        let (volume, centroid) = oriented_volume_and_centroid(mesh, &boundary);

        if volume <= tol.point.powi(2) {
            // Zero-volume groups are slivers of the radial sort; refuse only
            // if they carry real boundary area.
            log::warn!("discarding degenerate region with volume {:.3e}", volume);
            continue;
        }

        let cell = mesh.add_cell(VolumeCell {
            boundary,
            position: Position::Undecided,
            state: CellState::Raw,
            volume,
            centroid,
        });

        for &(fi, side) in &group {
            mesh.facet_mut(FacetId(fi as u32)).cells[side] = Some(cell);
        }

        cells.push(cell);
    }

    // Every inner half of an element-side facet and both halves of every cut
    // facet must have resolved to a cell.
    for fi in 0..facet_count {
        let facet = mesh.facet(FacetId(fi as u32));
        if facet.flags.contains(FacetFlags::ON_ELEMENT_SIDE) {
            if facet.cells[0].is_none() {
                return Err(CutError::invariant("element facet without interior cell"));
            }
        } else if facet.cells[0].is_none() || facet.cells[1].is_none() {
            return Err(CutError::invariant("cut facet not adjacent to two regions"));
        }
    }

    let total: Real = cells.iter().map(|c| mesh.cell(*c).volume).sum();
    log::debug!(
        "volume cell finder: {} cells, total volume {:.6e}",
        cells.len(),
        total
    );

    Ok(cells)
}

/// The boundary triangles of `cell` oriented with outward normals, paired
/// with the facet they belong to.
///
/// Dangling facets (both halves on the same cell) are excluded: they carry no
/// closed-boundary information.
pub fn closed_boundary_tris(mesh: &CutMesh, cell: CellId) -> Vec<([PointId; 3], FacetId)> {
    let mut out = Vec::new();
    for of in &mesh.cell(cell).boundary {
        let facet = mesh.facet(of.facet);
        if facet.is_dangling() {
            continue;
        }
        for tri in &facet.tris {
            let tri = if of.cell_on_plus_side {
                // The facet winding normal points into the cell: flip.
                [tri[0], tri[2], tri[1]]
            } else {
                *tri
            };
            out.push((tri, of.facet));
        }
    }
    out
}

/// The dangling facets of `cell` (internal walls that do not separate it).
pub fn dangling_facets(mesh: &CutMesh, cell: CellId) -> Vec<FacetId> {
    let mut out: SmallVec<[FacetId; 4]> = SmallVec::new();
    for of in &mesh.cell(cell).boundary {
        if mesh.facet(of.facet).is_dangling() && !out.contains(&of.facet) {
            out.push(of.facet);
        }
    }
    out.into_vec()
}

fn oriented_volume_and_centroid(
    mesh: &CutMesh,
    boundary: &[OrientedFacet],
) -> (Real, Point<Real>) {
    let mut volume = 0.0;
    let mut centroid = Vector::zeros();

    for of in boundary {
        let facet = mesh.facet(of.facet);
        for tri in &facet.tris {
            let [mut a, mut b, mut c] = tri.map(|p| mesh.point(p).coords);
            if of.cell_on_plus_side {
                std::mem::swap(&mut b, &mut c);
            }
            let v = a.dot(&b.cross(&c)) / 6.0;
            volume += v;
            centroid += (a + b + c) / 4.0 * v;
        }
    }

    if volume.abs() > 0.0 {
        (volume, Point::from(centroid / volume))
    } else {
        (volume, Point::origin())
    }
}
