use crate::topology::SideId;

/// Errors that can abort a cut session.
///
/// All non-fatal conditions (touching intersections, infeasible
/// tessellations, residual cut sides) are handled internally by snapping,
/// escalation to the recursive cut, or the direct-divergence fallback. What
/// surfaces here ends the affected element's session; other elements are
/// unaffected because sessions share no state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CutError {
    /// A geometric predicate could not be decided, even by the
    /// arbitrary-precision branch. Not expected in practice.
    #[error("geometric predicate undecided ({detail}) in element {element_id:?}")]
    GeometryIndeterminate {
        /// The element being cut, when known.
        element_id: Option<u32>,
        /// Offending entity description.
        detail: String,
    },

    /// An intersection could not be classified within tolerance.
    #[error("degenerate intersection in element {element_id:?}: {detail}")]
    DegenerateIntersection {
        /// The element being cut, when known.
        element_id: Option<u32>,
        /// Offending entity description.
        detail: String,
    },

    /// No tessellation satisfying the facet constraints and the quality
    /// thresholds exists, and the direct-divergence fallback is disabled.
    #[error("tessellation infeasible for element {element_id:?}")]
    TessellationInfeasible {
        /// The element being cut, when known.
        element_id: Option<u32>,
    },

    /// The recursive cut exceeded its depth limit and the direct-divergence
    /// fallback is disabled.
    #[error("recursive cut depth exceeded for element {element_id:?}")]
    RecursiveDepthExceeded {
        /// The element being cut, when known.
        element_id: Option<u32>,
    },

    /// A topological invariant was violated. Always a bug, never an input
    /// problem.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Malformed ingest data (wrong node count, unsupported shape).
    #[error("invalid ingest: {0}")]
    InvalidInput(String),
}

impl CutError {
    pub(crate) fn invariant(detail: &str) -> Self {
        CutError::Invariant(detail.to_owned())
    }

    pub(crate) fn degenerate_intersection(detail: String) -> Self {
        CutError::DegenerateIntersection {
            element_id: None,
            detail,
        }
    }

    pub(crate) fn degenerate_side(side: SideId) -> Self {
        CutError::DegenerateIntersection {
            element_id: None,
            detail: format!("side {:?} produced a degenerate overlay", side),
        }
    }

    /// Attaches the element id to errors bubbling out of an element session.
    pub(crate) fn with_element(self, id: u32) -> Self {
        match self {
            CutError::GeometryIndeterminate { detail, .. } => CutError::GeometryIndeterminate {
                element_id: Some(id),
                detail,
            },
            CutError::DegenerateIntersection { detail, .. } => CutError::DegenerateIntersection {
                element_id: Some(id),
                detail,
            },
            CutError::TessellationInfeasible { .. } => {
                CutError::TessellationInfeasible { element_id: Some(id) }
            }
            CutError::RecursiveDepthExceeded { .. } => {
                CutError::RecursiveDepthExceeded { element_id: Some(id) }
            }
            other => other,
        }
    }
}
