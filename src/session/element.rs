//! The per-element cut pipeline.
//!
//! One background element plus its cut sides form an independent session:
//! every element gets its own mesh and point pool, runs to completion without
//! suspension points, and never shares state with other elements.

use crate::cells::find_volume_cells;
use crate::divergence::divergence_points;
use crate::facets::{build_facets, ElementShell};
use crate::integration::{
    tet_gauss_points, triangle_gauss_points, BoundaryIntegrationPoint, IntegrationPoint,
};
use crate::intersect::{find_intersections, IntersectionSet, Tolerances};
use crate::levelset::{build_level_set_front, LEVEL_SET_SIDE_ID};
use crate::math::{Point, Real};
use crate::pool::PointId;
use crate::session::{CutError, CutOptions, IntegrationStrategy, SignSource};
use crate::shape::{interpolate, local_coordinates, CellType};
use crate::tessellation::{oriented_tet_volume, tessellate_cell, TessellationFailure};
use crate::tetmesh;
use crate::topology::{
    CellId, CellState, CutMesh, EdgeId, FacetFlags, Position, SideId, SideKind,
};

/// Geometry of one cut side as handed to an element session.
#[derive(Clone, Debug)]
pub(crate) struct CutSideDescriptor {
    pub external_id: u32,
    pub corners: Vec<Point<Real>>,
}

/// The integration description of one volume cell.
#[derive(Clone, Debug)]
pub(crate) struct CellOutcome {
    pub position: Position,
    pub state: CellState,
    pub volume: Real,
    pub points: Vec<IntegrationPoint>,
    pub boundary: Vec<BoundaryIntegrationPoint>,
}

/// The outcome of one element session.
#[derive(Debug)]
pub(crate) struct ElementOutcome {
    pub mesh: CutMesh,
    pub cells: Vec<CellOutcome>,
    /// Position tag per element node (corner nodes first).
    pub node_positions: Vec<Position>,
}

/// Runs the full pipeline on one element.
pub(crate) fn cut_element(
    external_id: u32,
    shape: CellType,
    nodes: &[Point<Real>],
    cut_sides: &[CutSideDescriptor],
    level_set: Option<&[Real]>,
    opts: &CutOptions,
    depth: usize,
    suppress_coplanar_boundary: bool,
) -> Result<ElementOutcome, CutError> {
    cut_element_inner(
        shape,
        nodes,
        cut_sides,
        level_set,
        opts,
        depth,
        suppress_coplanar_boundary,
    )
    .map_err(|e| e.with_element(external_id))
}

fn cut_element_inner(
    shape: CellType,
    nodes: &[Point<Real>],
    cut_sides: &[CutSideDescriptor],
    level_set: Option<&[Real]>,
    opts: &CutOptions,
    depth: usize,
    suppress_coplanar_boundary: bool,
) -> Result<ElementOutcome, CutError> {
    if !shape.is_volume() {
        return Err(CutError::InvalidInput(format!(
            "{:?} is not a volume shape",
            shape
        )));
    }
    let corner_count = shape.corner_count();
    if nodes.len() < corner_count {
        return Err(CutError::InvalidInput(format!(
            "{:?} needs {} nodes, got {}",
            shape,
            corner_count,
            nodes.len()
        )));
    }
    let corners = &nodes[..corner_count];

    if let Some(values) = level_set {
        if values.len() < corner_count {
            return Err(CutError::InvalidInput(
                "level-set values must cover every corner node".to_owned(),
            ));
        }
    }

    // Absolute tolerances from the element size.
    let (bb_min, bb_max) = bounding_box(corners);
    let scale = (bb_max - bb_min).norm().max(1.0e-300);
    let pool_tol = opts.position_tolerance * scale;
    let tol = Tolerances {
        point: (1.0e-12 * scale).max(pool_tol),
        param: (1.0e-12 * scale).max(pool_tol),
    };

    let mut mesh = CutMesh::new(pool_tol);

    // Corner points and element edges.
    let corner_ids: Vec<PointId> = corners.iter().map(|c| mesh.insert_point(*c)).collect();
    let element_edges: Vec<EdgeId> = shape
        .edges()
        .iter()
        .map(|[i, j]| mesh.add_edge(corner_ids[*i], corner_ids[*j]))
        .collect();

    // Element sides, with their loops oriented outward.
    let elem_centroid = centroid(corners);
    let mut shell = ElementShell {
        planes: Vec::new(),
        sides: Vec::new(),
    };
    for (fi, face) in shape.faces().iter().enumerate() {
        let mut loop_ids: Vec<PointId> = face.iter().map(|k| corner_ids[*k]).collect();
        let loop_pts: Vec<Point<Real>> = loop_ids.iter().map(|p| mesh.point(*p)).collect();
        let plane = crate::predicates::Plane::from_points(&loop_pts)
            .ok_or_else(|| CutError::invariant("degenerate element face"))?;

        let face_centroid = centroid(&loop_pts);
        if plane.normal.dot(&(face_centroid - elem_centroid)) < 0.0 {
            loop_ids.reverse();
        }

        let side = mesh
            .add_side(SideKind::Element { face: fi }, loop_ids)
            .ok_or_else(|| CutError::invariant("degenerate element face"))?;
        shell.planes.push(mesh.side(side).plane);
        shell.sides.push(side);
    }

    // Cut side registration (bounding-box filtered).
    let mut cut_side_ids: Vec<SideId> = Vec::new();
    if level_set.is_none() {
        for descriptor in cut_sides {
            if !bbox_overlap(corners, &descriptor.corners, tol.point * 10.0) {
                continue;
            }
            let ids: Vec<PointId> = descriptor
                .corners
                .iter()
                .map(|c| mesh.insert_point(*c))
                .collect();
            match mesh.add_side(
                SideKind::Cut {
                    external_id: descriptor.external_id,
                },
                ids,
            ) {
                Some(side) => cut_side_ids.push(side),
                None => {
                    log::warn!(
                        "skipping degenerate cut side {}",
                        descriptor.external_id
                    );
                }
            }
        }
    }

    // Intersection pass (or level-set front construction).
    let mut set = IntersectionSet::default();
    if let Some(values) = level_set {
        let fronts = build_level_set_front(
            &mut mesh,
            shape,
            &corner_ids,
            &element_edges,
            &shell.sides,
            &values[..corner_count],
            &mut set,
            &tol,
        )?;
        cut_side_ids.extend(fronts);
    } else if !cut_side_ids.is_empty() {
        set = find_intersections(&mut mesh, &shell.sides, &cut_side_ids, &tol);
    }

    // Facets and volume cells.
    build_facets(
        &mut mesh,
        &shell,
        &cut_side_ids,
        &set,
        &tol,
        level_set.is_some(),
    )?;

    let cell_ids = find_volume_cells(&mut mesh, &tol)?;
    if cell_ids.is_empty() {
        return Err(CutError::invariant("element produced no volume cells"));
    }

    let has_cut_facets = mesh
        .facets()
        .any(|(_, f)| f.flags.contains(FacetFlags::ON_CUT_SIDE));

    // Inside/outside classification.
    for &cell in &cell_ids {
        let position = classify_cell(&mesh, cell, shape, corners, level_set, opts);
        mesh.cell_mut(cell).position = position;
    }

    // Volume conservation across the decomposition.
    let element_vol = element_volume(shape, corners);
    let total: Real = cell_ids.iter().map(|c| mesh.cell(*c).volume).sum();
    if (total - element_vol).abs() > 1.0e-8 * element_vol.max(1.0e-300) {
        return Err(CutError::invariant(
            "volume cells do not cover the element",
        ));
    }

    // Node position tags.
    let node_positions = tag_node_positions(&mesh, &corner_ids, level_set);

    // Integration.
    let mut outcomes = Vec::with_capacity(cell_ids.len());
    for &cell in &cell_ids {
        let outcome = integrate_cell(
            &mut mesh,
            cell,
            shape,
            &corner_ids,
            has_cut_facets,
            cut_sides,
            opts,
            depth,
            suppress_coplanar_boundary,
        )?;
        outcomes.push(outcome);
    }

    Ok(ElementOutcome {
        mesh,
        cells: outcomes,
        node_positions,
    })
}

/// Tags every element node with its position relative to the cut.
///
/// Level-set elements use the exact nodal sign; mesh cuts derive the tag from
/// the cells whose boundary carries the node.
fn tag_node_positions(
    mesh: &CutMesh,
    corner_ids: &[PointId],
    level_set: Option<&[Real]>,
) -> Vec<Position> {
    if let Some(values) = level_set {
        return corner_ids
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let v = values[i];
                if v > 0.0 {
                    Position::Outside
                } else if v < 0.0 {
                    Position::Inside
                } else {
                    Position::OnCutSurface
                }
            })
            .collect();
    }

    corner_ids
        .iter()
        .map(|corner| {
            let mut tag = Position::Undecided;
            for (_, facet) in mesh.facets() {
                if !facet.tris.iter().any(|tri| tri.contains(corner)) {
                    continue;
                }
                if facet.flags.contains(FacetFlags::ON_CUT_SIDE) {
                    return Position::OnCutSurface;
                }
                for cell in facet.cells.iter().flatten() {
                    match mesh.cell(*cell).position {
                        Position::Undecided => {}
                        position => tag = position,
                    }
                }
            }
            tag
        })
        .collect()
}

fn integrate_cell(
    mesh: &mut CutMesh,
    cell: CellId,
    shape: CellType,
    corner_ids: &[PointId],
    has_cut_facets: bool,
    session_cut_sides: &[CutSideDescriptor],
    opts: &CutOptions,
    depth: usize,
    suppress_coplanar_boundary: bool,
) -> Result<CellOutcome, CutError> {
    let position = mesh.cell(cell).position;
    let volume = mesh.cell(cell).volume;
    let boundary = boundary_points(mesh, cell, suppress_coplanar_boundary);

    // Uncut fast path: standard tet decomposition, no tessellation machinery.
    if !has_cut_facets {
        let mut points = Vec::new();
        for tet in shape.tet_decomposition() {
            let [a, b, c, d] = tet.map(|k| mesh.point(corner_ids[k]));
            points.extend(tet_gauss_points(&a, &b, &c, &d));
        }
        mesh.cell_mut(cell).state = CellState::Accepted;
        return Ok(CellOutcome {
            position,
            state: CellState::Accepted,
            volume,
            points,
            boundary,
        });
    }

    let mut strategy = opts.integration_strategy;
    let mut state = CellState::Raw;
    let mut points: Option<Vec<IntegrationPoint>> = None;
    let mut extra_boundary: Vec<BoundaryIntegrationPoint> = Vec::new();

    if strategy == IntegrationStrategy::Tessellation {
        match tessellate_cell(mesh, cell, opts) {
            Ok(tess) => {
                if tess.needs_recursion {
                    if depth < opts.recursive_cut_depth {
                        log::warn!(
                            "cell {:?} crossed by residual cut surface, recursing (depth {})",
                            cell,
                            depth + 1
                        );
                        let residual = residual_cut_sides(mesh, cell, session_cut_sides);
                        let (rec_points, rec_boundary) = tetmesh::recursive_cut(
                            mesh,
                            &tess.tets,
                            &residual,
                            opts,
                            depth + 1,
                        )?;
                        points = Some(rec_points);
                        extra_boundary = rec_boundary;
                        state = CellState::Recursive;
                    } else if opts.divergence_fallback {
                        log::warn!(
                            "recursion depth exhausted for cell {:?}, falling back to divergence",
                            cell
                        );
                        strategy = IntegrationStrategy::DirectDivergence;
                    } else {
                        return Err(CutError::RecursiveDepthExceeded { element_id: None });
                    }
                } else {
                    let tet_points: Vec<IntegrationPoint> = tess
                        .tets
                        .iter()
                        .flat_map(|tet| {
                            let [a, b, c, d] = tet.map(|p| mesh.point(p));
                            tet_gauss_points(&a, &b, &c, &d)
                        })
                        .collect();
                    points = Some(tet_points);
                    state = CellState::Tessellated;
                }
            }
            Err(TessellationFailure::Infeasible) => {
                if opts.divergence_fallback {
                    strategy = IntegrationStrategy::DirectDivergence;
                } else {
                    return Err(CutError::TessellationInfeasible { element_id: None });
                }
            }
        }
    }

    if points.is_none() && strategy == IntegrationStrategy::DirectDivergence {
        let reference_x = reference_plane_x(mesh, corner_ids);
        points = Some(divergence_points(mesh, cell, reference_x));
        state = CellState::DirectDivergence;
    }

    let points = points.ok_or_else(|| CutError::invariant("no integration strategy applied"))?;

    // The integration description must reproduce the cell volume.
    let weight_sum: Real = points.iter().map(|p| p.weight).sum();
    if (weight_sum - volume).abs() > 1.0e-8 * volume.max(1.0e-300) {
        return Err(CutError::invariant(
            "integration weights do not reproduce the cell volume",
        ));
    }

    mesh.cell_mut(cell).state = CellState::Accepted;

    let mut boundary = boundary;
    boundary.extend(extra_boundary);

    Ok(CellOutcome {
        position,
        state: if state == CellState::Raw {
            CellState::Accepted
        } else {
            state
        },
        volume,
        points,
        boundary,
    })
}

/// Surface integration points of every cut facet bounding `cell`.
fn boundary_points(
    mesh: &CutMesh,
    cell: CellId,
    suppress_coplanar: bool,
) -> Vec<BoundaryIntegrationPoint> {
    let mut out = Vec::new();
    let mut done = Vec::new();

    for of in &mesh.cell(cell).boundary {
        let facet = mesh.facet(of.facet);
        if !facet.flags.contains(FacetFlags::ON_CUT_SIDE) {
            continue;
        }
        if suppress_coplanar && facet.flags.contains(FacetFlags::COPLANAR) {
            continue;
        }
        if done.contains(&of.facet) {
            continue;
        }
        done.push(of.facet);

        let side_id = facet
            .cut_source
            .and_then(|s| mesh.side(s).external_id())
            .unwrap_or(LEVEL_SET_SIDE_ID);

        // Outward from the cell: the facet winding normal points to its plus
        // side; flip when the cell is there. Dangling facets keep the facet's
        // own orientation.
        let flip = of.cell_on_plus_side && !facet.is_dangling();

        for tri in &facet.tris {
            let [a, b, c] = tri.map(|p| mesh.point(p));
            let normal = (b - a).cross(&(c - a));
            let normal = match normal.try_normalize(0.0) {
                Some(n) => {
                    if flip {
                        -n
                    } else {
                        n
                    }
                }
                None => continue,
            };
            for point in triangle_gauss_points(&a, &b, &c) {
                out.push(BoundaryIntegrationPoint {
                    position: point.position,
                    weight: point.weight,
                    normal,
                    side_id,
                });
            }
        }
    }

    out
}

/// The cut sides whose facets remained dangling inside `cell`.
fn residual_cut_sides(
    mesh: &CutMesh,
    cell: CellId,
    session_cut_sides: &[CutSideDescriptor],
) -> Vec<CutSideDescriptor> {
    let mut out: Vec<CutSideDescriptor> = Vec::new();
    for facet_id in crate::cells::dangling_facets(mesh, cell) {
        let facet = mesh.facet(facet_id);
        let Some(source) = facet.cut_source else {
            continue;
        };
        let side = mesh.side(source);
        let external_id = side.external_id().unwrap_or(LEVEL_SET_SIDE_ID);

        if out.iter().any(|d| d.external_id == external_id) {
            continue;
        }

        // Prefer the original ingest geometry; fall back to the side loop as
        // registered on this mesh (level-set patches).
        if let Some(descriptor) = session_cut_sides
            .iter()
            .find(|d| d.external_id == external_id)
        {
            out.push(descriptor.clone());
        } else {
            out.push(CutSideDescriptor {
                external_id,
                corners: side.points.iter().map(|p| mesh.point(*p)).collect(),
            });
        }
    }
    out
}

fn classify_cell(
    mesh: &CutMesh,
    cell: CellId,
    shape: CellType,
    corners: &[Point<Real>],
    level_set: Option<&[Real]>,
    opts: &CutOptions,
) -> Position {
    match (level_set, opts.sign_source) {
        (Some(values), SignSource::LevelSet) => {
            let centroid = mesh.cell(cell).centroid;
            match local_coordinates(shape, corners, &centroid)
                .map(|xi| interpolate(shape, values, &xi))
            {
                Some(phi) if phi > 0.0 => Position::Outside,
                Some(_) => Position::Inside,
                None => Position::Undecided,
            }
        }
        _ => {
            // The first adjacent non-dangling cut facet decides: the cut
            // normal points from inside to outside.
            for of in &mesh.cell(cell).boundary {
                let facet = mesh.facet(of.facet);
                if facet.flags.contains(FacetFlags::ON_CUT_SIDE) && !facet.is_dangling() {
                    return if of.cell_on_plus_side {
                        Position::Outside
                    } else {
                        Position::Inside
                    };
                }
            }
            Position::Undecided
        }
    }
}

/// The x-coordinate of the direct-divergence reference plane: just before the
/// element, so internal lines stay short.
fn reference_plane_x(mesh: &CutMesh, corner_ids: &[PointId]) -> Real {
    let min_x = corner_ids
        .iter()
        .map(|p| mesh.point(*p).x)
        .fold(Real::MAX, Real::min);
    min_x
}

/// Element volume from the standard tet decomposition of the corner nodes.
pub(crate) fn element_volume(shape: CellType, corners: &[Point<Real>]) -> Real {
    let mut total = 0.0;
    for tet in shape.tet_decomposition() {
        let [a, b, c, d] = tet.map(|k| corners[k]);
        total += oriented_tet_volume(&a, &b, &c, &d).abs();
    }
    total
}

fn bounding_box(points: &[Point<Real>]) -> (Point<Real>, Point<Real>) {
    let mut min = points[0];
    let mut max = points[0];
    for p in points.iter().skip(1) {
        min = min.inf(p);
        max = max.sup(p);
    }
    (min, max)
}

fn bbox_overlap(a: &[Point<Real>], b: &[Point<Real>], margin: Real) -> bool {
    let (amin, amax) = bounding_box(a);
    let (bmin, bmax) = bounding_box(b);
    (0..3).all(|k| amax[k] + margin >= bmin[k] && bmax[k] + margin >= amin[k])
}

fn centroid(points: &[Point<Real>]) -> Point<Real> {
    let mut acc = na::Vector3::zeros();
    for p in points {
        acc += p.coords;
    }
    Point::from(acc / points.len() as Real)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cells::closed_boundary_tris;
    use crate::math::Vector;

    fn unit_cube() -> Vec<Point<Real>> {
        vec![
            Point::new(1.0, 1.0, 1.0),
            Point::new(1.0, 0.0, 1.0),
            Point::new(0.0, 0.0, 1.0),
            Point::new(0.0, 1.0, 1.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
    }

    fn quad(corners: [[Real; 3]; 4]) -> Vec<Point<Real>> {
        corners
            .iter()
            .map(|c| Point::new(c[0], c[1], c[2]))
            .collect()
    }

    /// Two quads meeting along a shared interior edge: the edge must resolve
    /// to a single edge entity without duplicated points along it.
    #[test]
    fn v_cut_shared_edge_deduplicates() {
        let sides = [
            CutSideDescriptor {
                external_id: 1,
                corners: quad([
                    [0.5, 0.5, -0.2],
                    [0.5, 0.5, 1.2],
                    [-0.5, 1.5, 1.2],
                    [-0.5, 1.5, -0.2],
                ]),
            },
            CutSideDescriptor {
                external_id: 2,
                corners: quad([
                    [0.9, 1.5, -0.2],
                    [0.9, 1.5, 1.2],
                    [0.5, 0.5, 1.2],
                    [0.5, 0.5, -0.2],
                ]),
            },
        ];

        let opts = CutOptions::default();
        let outcome = cut_element(
            1,
            CellType::Hex8,
            &unit_cube(),
            &sides,
            None,
            &opts,
            0,
            false,
        )
        .unwrap();

        let mesh = &outcome.mesh;
        let a = mesh.pool().find(&Point::new(0.5, 0.5, -0.2)).unwrap();
        let b = mesh.pool().find(&Point::new(0.5, 0.5, 1.2)).unwrap();
        assert!(mesh.edge_between(a, b).is_some());

        // Points on the shared line: the two quad corners plus the two
        // piercings of the cube faces z = 0 and z = 1. Nothing else.
        let on_line = mesh
            .pool()
            .iter()
            .filter(|(_, p)| (p.x - 0.5).abs() < 1.0e-12 && (p.y - 0.5).abs() < 1.0e-12)
            .count();
        assert_eq!(on_line, 4);
    }

    /// Internal facets are shared by exactly two cells, and every cell's
    /// oriented boundary closes up.
    #[test]
    fn facet_sharing_and_boundary_closure() {
        let sides = [
            CutSideDescriptor {
                external_id: 1,
                corners: quad([
                    [0.1, 0.02, 0.0],
                    [1.0, 0.02, 0.0],
                    [1.0, 0.02, 1.0],
                    [0.1, 0.02, 1.0],
                ]),
            },
            CutSideDescriptor {
                external_id: 2,
                corners: quad([
                    [0.1, 0.02, 0.0],
                    [0.1, 0.02, 1.0],
                    [0.1, 1.0, 1.0],
                    [0.1, 1.0, 0.0],
                ]),
            },
        ];

        let opts = CutOptions::default();
        let outcome = cut_element(
            1,
            CellType::Hex8,
            &unit_cube(),
            &sides,
            None,
            &opts,
            0,
            false,
        )
        .unwrap();

        let mesh = &outcome.mesh;
        for (_, facet) in mesh.facets() {
            if facet.flags.contains(FacetFlags::ON_CUT_SIDE) && !facet.is_dangling() {
                assert!(facet.cells[0].is_some());
                assert!(facet.cells[1].is_some());
                assert_ne!(facet.cells[0], facet.cells[1]);
            }
        }

        for (cell, data) in mesh.cells() {
            let mut area = Vector::zeros();
            for (tri, _) in closed_boundary_tris(mesh, cell) {
                let [a, b, c] = tri.map(|p| mesh.point(p));
                area += (b - a).cross(&(c - a)) * 0.5;
            }
            assert!(
                area.norm() <= 1.0e-12,
                "cell {:?} boundary does not close: residual area {:?}",
                cell,
                area
            );
            assert!(data.volume > 0.0);
        }
    }
}
