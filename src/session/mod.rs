//! The public cut session.
//!
//! A [`CutSession`] ingests background elements and cut sides (or nodal
//! level-set fields), runs the cutting pipeline on every element, and returns
//! a [`CutResult`] carrying integration points, boundary cells and the
//! inside/outside tags. Elements are cut independently: each one gets its own
//! point pool and topology, so sessions for different elements can be
//! dispatched across threads by the caller.

pub use self::error::CutError;
pub use self::options::{CutOptions, IntegrationStrategy, SignSource};
pub use self::result::{CellResult, CutResult, ElementResult};

pub(crate) mod element;

mod error;
mod options;
mod result;

use crate::math::{Point, Real};
use crate::session::element::{cut_element, CutSideDescriptor};
use crate::shape::CellType;
use crate::topology::CellState;

/// Handle of an ingested background element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u32);

/// Handle of an ingested cut side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SideHandle(pub u32);

#[derive(Clone, Debug)]
struct IngestElement {
    id: u32,
    shape: CellType,
    nodes: Vec<Point<Real>>,
    values: Option<Vec<Real>>,
}

#[derive(Clone, Debug)]
struct IngestSide {
    id: u32,
    corners: Vec<Point<Real>>,
}

/// A cut session: background elements plus the cut surfaces to cut them with.
#[derive(Clone, Debug)]
pub struct CutSession {
    options: CutOptions,
    elements: Vec<IngestElement>,
    cut_sides: Vec<IngestSide>,
}

impl CutSession {
    /// Creates an empty session with the given options.
    pub fn new(options: CutOptions) -> Self {
        CutSession {
            options,
            elements: Vec::new(),
            cut_sides: Vec::new(),
        }
    }

    /// The options of this session.
    pub fn options(&self) -> &CutOptions {
        &self.options
    }

    /// Registers a background element.
    ///
    /// `shape` must be a volume shape; quadratic elements are cut through
    /// their corner nodes. `node_ids` and `node_coords` must both match the
    /// node count of the shape.
    pub fn add_element(
        &mut self,
        id: u32,
        node_ids: &[u32],
        node_coords: &[Point<Real>],
        shape: CellType,
    ) -> Result<ElementHandle, CutError> {
        self.validate_nodes(node_ids, node_coords, shape, true)?;
        let handle = ElementHandle(self.elements.len() as u32);
        self.elements.push(IngestElement {
            id,
            shape,
            nodes: node_coords.to_vec(),
            values: None,
        });
        Ok(handle)
    }

    /// Registers a cut side.
    ///
    /// `shape` must be a surface shape; quadratic sides are cut through their
    /// corner nodes.
    pub fn add_cut_side(
        &mut self,
        id: u32,
        node_ids: &[u32],
        node_coords: &[Point<Real>],
        shape: CellType,
    ) -> Result<SideHandle, CutError> {
        self.validate_nodes(node_ids, node_coords, shape, false)?;
        let handle = SideHandle(self.cut_sides.len() as u32);
        self.cut_sides.push(IngestSide {
            id,
            corners: node_coords[..shape.corner_count()].to_vec(),
        });
        Ok(handle)
    }

    /// Registers a background element cut by the zero isocontour of the nodal
    /// level-set field `node_values`.
    pub fn add_level_set_element(
        &mut self,
        id: u32,
        node_ids: &[u32],
        node_coords: &[Point<Real>],
        node_values: &[Real],
        shape: CellType,
    ) -> Result<ElementHandle, CutError> {
        self.validate_nodes(node_ids, node_coords, shape, true)?;
        if node_values.len() != node_coords.len() {
            return Err(CutError::InvalidInput(
                "one level-set value per node is required".to_owned(),
            ));
        }
        let handle = ElementHandle(self.elements.len() as u32);
        self.elements.push(IngestElement {
            id,
            shape,
            nodes: node_coords.to_vec(),
            values: Some(node_values.to_vec()),
        });
        Ok(handle)
    }

    /// Cuts every registered element and returns the integration description.
    ///
    /// Elements are processed independently and in ingest order; identical
    /// input produces identical output, down to the internal point ids.
    pub fn cut(&self) -> Result<CutResult, CutError> {
        let descriptors: Vec<CutSideDescriptor> = self
            .cut_sides
            .iter()
            .map(|s| CutSideDescriptor {
                external_id: s.id,
                corners: s.corners.clone(),
            })
            .collect();

        let mut result = CutResult::default();

        for ingest in &self.elements {
            let mut opts = self.options;
            if ingest.values.is_some() {
                opts.sign_source = SignSource::LevelSet;
            }

            let outcome = cut_element(
                ingest.id,
                ingest.shape,
                &ingest.nodes,
                &descriptors,
                ingest.values.as_deref(),
                &opts,
                0,
                false,
            )?;

            let cells = outcome
                .cells
                .into_iter()
                .map(|cell| CellResult {
                    position: cell.position,
                    state: cell.state,
                    volume: cell.volume,
                    points: cell.points,
                    boundary: cell.boundary,
                })
                .collect();

            result.elements.push(ElementResult {
                id: ingest.id,
                shape: ingest.shape,
                cells,
                node_positions: outcome.node_positions,
            });
        }

        debug_assert!(result
            .elements
            .iter()
            .flat_map(|e| e.cells.iter())
            .all(|c| c.state != CellState::Raw));

        Ok(result)
    }

    fn validate_nodes(
        &self,
        node_ids: &[u32],
        node_coords: &[Point<Real>],
        shape: CellType,
        volume: bool,
    ) -> Result<(), CutError> {
        if volume && !shape.is_volume() {
            return Err(CutError::InvalidInput(format!(
                "{:?} is not a volume shape",
                shape
            )));
        }
        if !volume && !shape.is_surface() {
            return Err(CutError::InvalidInput(format!(
                "{:?} is not a surface shape",
                shape
            )));
        }
        if node_ids.len() != shape.node_count() || node_coords.len() != shape.node_count() {
            return Err(CutError::InvalidInput(format!(
                "{:?} expects {} nodes, got {} ids and {} coordinates",
                shape,
                shape.node_count(),
                node_ids.len(),
                node_coords.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;

    #[test]
    fn ingest_validation() {
        let mut session = CutSession::new(CutOptions::default());
        let coords = [Point::origin(); 3];
        assert!(session
            .add_cut_side(1, &[0, 1, 2], &coords, CellType::Tri3)
            .is_ok());
        assert!(session
            .add_cut_side(2, &[0, 1], &coords[..2], CellType::Tri3)
            .is_err());
        assert!(session
            .add_element(1, &[0, 1, 2], &coords, CellType::Tri3)
            .is_err());
    }
}
