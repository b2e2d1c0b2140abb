use crate::math::Real;

/// How volume integration points are generated for the cut cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegrationStrategy {
    /// Decompose every volume cell into tetrahedral sub-cells.
    Tessellation,
    /// Generate facet-based Gauss points via the divergence theorem, without
    /// tetrahedralization.
    DirectDivergence,
}

/// Where the inside/outside sign of a volume cell comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignSource {
    /// The orientation of the cut sides: cells on the side a cut normal
    /// points into are outside.
    CutSides,
    /// The sign of the level-set field at a point inside the cell.
    LevelSet,
}

/// Configuration of a cut session, carried by value through every operation.
///
/// There is no global mutable state: two sessions with different options
/// never influence each other.
#[derive(Copy, Clone, Debug)]
pub struct CutOptions {
    /// Relative coincidence tolerance of the point pool; scaled by the
    /// element bounding-box diagonal when a session derives its absolute
    /// tolerances.
    pub position_tolerance: Real,
    /// Volume integration strategy.
    pub integration_strategy: IntegrationStrategy,
    /// Maximum depth of the recursive cut; exceeding it gives up on the cell
    /// (direct divergence when enabled, failure otherwise).
    pub recursive_cut_depth: usize,
    /// Minimum accepted tet quality (scale-invariant flatness, `1` is the
    /// regular tet).
    pub allow_flat_ratio: Real,
    /// Sign source for the inside/outside classification.
    pub sign_source: SignSource,
    /// Escalate to direct divergence instead of failing when tessellation is
    /// infeasible or the recursion depth is exhausted.
    pub divergence_fallback: bool,
}

impl Default for CutOptions {
    fn default() -> Self {
        CutOptions {
            position_tolerance: 1.0e-14,
            integration_strategy: IntegrationStrategy::Tessellation,
            recursive_cut_depth: 2,
            allow_flat_ratio: 1.0e-10,
            sign_source: SignSource::CutSides,
            divergence_fallback: true,
        }
    }
}
