use crate::integration::{BoundaryIntegrationPoint, IntegrationPoint};
use crate::math::Real;
use crate::shape::CellType;
use crate::topology::{CellState, Position};

/// The integration description of one volume cell, as consumed by callers.
#[derive(Clone, Debug)]
pub struct CellResult {
    pub(crate) position: Position,
    pub(crate) state: CellState,
    pub(crate) volume: Real,
    pub(crate) points: Vec<IntegrationPoint>,
    pub(crate) boundary: Vec<BoundaryIntegrationPoint>,
}

impl CellResult {
    /// Inside/outside classification of this cell.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The final pipeline state of this cell.
    pub fn state(&self) -> CellState {
        self.state
    }

    /// The volume of this cell.
    pub fn volume(&self) -> Real {
        self.volume
    }

    /// The volume integration points of this cell. Their weights sum to the
    /// cell volume.
    pub fn integration_points(&self) -> impl Iterator<Item = &IntegrationPoint> {
        self.points.iter()
    }

    /// The surface integration points of the cut facets bounding this cell,
    /// with outward normals and source side ids.
    pub fn boundary_points(&self) -> impl Iterator<Item = &BoundaryIntegrationPoint> {
        self.boundary.iter()
    }
}

/// The cut outcome of one background element.
#[derive(Clone, Debug)]
pub struct ElementResult {
    pub(crate) id: u32,
    pub(crate) shape: CellType,
    pub(crate) cells: Vec<CellResult>,
    pub(crate) node_positions: Vec<Position>,
}

impl ElementResult {
    /// The caller-supplied element id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The element shape.
    pub fn shape(&self) -> CellType {
        self.shape
    }

    /// The volume cells of this element, in deterministic discovery order.
    pub fn volume_cells(&self) -> impl Iterator<Item = &CellResult> {
        self.cells.iter()
    }

    /// Number of volume cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The summed volume of all cells (equals the element volume).
    pub fn total_volume(&self) -> Real {
        self.cells.iter().map(|c| c.volume).sum()
    }

    /// Position tag of every corner node of the element.
    pub fn node_positions(&self) -> &[Position] {
        &self.node_positions
    }
}

/// The outcome of a whole cut session.
///
/// Callers consume the cut exclusively through this type; the internal
/// topology never escapes the session.
#[derive(Clone, Debug, Default)]
pub struct CutResult {
    pub(crate) elements: Vec<ElementResult>,
}

impl CutResult {
    /// The per-element results, in ingest order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementResult> {
        self.elements.iter()
    }

    /// Looks up the result of the element with the given id.
    pub fn element(&self, id: u32) -> Option<&ElementResult> {
        self.elements.iter().find(|e| e.id == id)
    }
}
