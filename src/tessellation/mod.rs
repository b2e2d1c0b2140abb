//! The tessellator.
//!
//! Decomposes every volume cell into tetrahedral integration sub-cells by
//! starring the cell's (already triangulated) boundary surface from a kernel
//! point. The centroid is tried first, then every boundary vertex; a
//! candidate is accepted only when every generated tet has positive oriented
//! volume, meets the flatness threshold, and the tet volumes add up to the
//! cell volume. Cells for which no kernel point exists are reported as
//! infeasible so the session can escalate to direct divergence.

pub use self::quality::{oriented_tet_volume, point_in_tet, tet_flatness};

mod quality;

use crate::cells::{closed_boundary_tris, dangling_facets};
use crate::math::{Point, Real};
use crate::pool::PointId;
use crate::session::CutOptions;
use crate::topology::{CellId, CutMesh, FacetId};

/// The tessellation of one volume cell.
#[derive(Clone, Debug)]
pub struct CellTessellation {
    /// Integration tets `(a, b, c, apex)`, all with positive oriented volume.
    pub tets: Vec<[PointId; 4]>,
    /// True when a tet is crossed by residual cut surface and the cell must
    /// be handed to the recursive cut.
    pub needs_recursion: bool,
}

/// Why a cell could not be tessellated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TessellationFailure {
    /// No kernel point produced an all-positive, volume-conserving star.
    Infeasible,
}

/// Tessellates one volume cell.
pub fn tessellate_cell(
    mesh: &mut CutMesh,
    cell: CellId,
    opts: &CutOptions,
) -> Result<CellTessellation, TessellationFailure> {
    let boundary = closed_boundary_tris(mesh, cell);
    if boundary.is_empty() {
        return Err(TessellationFailure::Infeasible);
    }

    let cell_volume = mesh.cell(cell).volume;
    let centroid = mesh.cell(cell).centroid;

    // Kernel point candidates: centroid first, then boundary vertices in id
    // order (deterministic).
    let mut vertex_candidates: Vec<PointId> = Vec::new();
    for (tri, _) in &boundary {
        for p in tri {
            if !vertex_candidates.contains(p) {
                vertex_candidates.push(*p);
            }
        }
    }
    vertex_candidates.sort_unstable();

    if let Some(tets) = try_star(mesh, &boundary, &centroid, None, cell_volume, opts) {
        let apex = mesh.insert_point(centroid);
        let tets = tets
            .into_iter()
            .map(|(tri, _)| [tri[0], tri[1], tri[2], apex])
            .collect();
        return Ok(finish(mesh, cell, tets));
    }

    for candidate in vertex_candidates {
        let x = mesh.point(candidate);
        if let Some(tets) = try_star(mesh, &boundary, &x, Some(candidate), cell_volume, opts) {
            let tets = tets
                .into_iter()
                .map(|(tri, _)| [tri[0], tri[1], tri[2], candidate])
                .collect();
            return Ok(finish(mesh, cell, tets));
        }
    }

    log::warn!(
        "tessellation infeasible for cell {:?} ({} boundary triangles)",
        cell,
        boundary.len()
    );
    Err(TessellationFailure::Infeasible)
}

/// Tries to star the boundary from `x`; returns the kept boundary triangles
/// when every tet is valid.
fn try_star(
    mesh: &CutMesh,
    boundary: &[([PointId; 3], FacetId)],
    x: &Point<Real>,
    x_id: Option<PointId>,
    cell_volume: Real,
    opts: &CutOptions,
) -> Option<Vec<([PointId; 3], FacetId)>> {
    let vol_eps = opts.allow_flat_ratio.max(1.0e-14) * cell_volume;

    let mut kept = Vec::with_capacity(boundary.len());
    let mut total = 0.0;
    let mut skipped = 0.0;

    for (tri, facet) in boundary {
        if let Some(id) = x_id {
            if tri.contains(&id) {
                continue;
            }
        }

        let [a, b, c] = tri.map(|p| mesh.point(p));
        let vol = oriented_tet_volume(&a, &b, &c, x);

        if vol.abs() <= vol_eps {
            // A face seen almost edge-on: contributes (almost) nothing, but
            // its omission must not change the total noticeably.
            skipped += vol.abs();
            continue;
        }
        if vol < 0.0 {
            return None;
        }
        if tet_flatness(&a, &b, &c, x) < opts.allow_flat_ratio {
            return None;
        }

        total += vol;
        kept.push((*tri, *facet));
    }

    let budget = 1.0e-9 * cell_volume.max(1.0e-300);
    if (total - cell_volume).abs() > budget.max(skipped * 2.0) {
        return None;
    }

    Some(kept)
}

fn finish(mesh: &CutMesh, cell: CellId, tets: Vec<[PointId; 4]>) -> CellTessellation {
    // A tet crossed by a dangling cut facet has unresolved cut surface in its
    // interior: hand the cell to the recursive cut.
    let dangling = dangling_facets(mesh, cell);
    let mut needs_recursion = false;

    'outer: for facet in &dangling {
        for tri in &mesh.facet(*facet).tris {
            let tri_pts = tri.map(|p| mesh.point(p));
            for tet in &tets {
                let [a, b, c, d] = tet.map(|p| mesh.point(p));
                let eps = 1.0e-12 * mesh.cell(cell).volume.cbrt().max(1.0e-30);
                // Interior hit of any triangle corner or its centroid.
                let centroid = Point::from(
                    (tri_pts[0].coords + tri_pts[1].coords + tri_pts[2].coords) / 3.0,
                );
                for p in tri_pts.iter().chain(std::iter::once(&centroid)) {
                    if point_in_tet(p, &a, &b, &c, &d, -eps) {
                        needs_recursion = true;
                        break 'outer;
                    }
                }
            }
        }
    }

    CellTessellation {
        tets,
        needs_recursion,
    }
}
