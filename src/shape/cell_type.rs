/// The geometric shape of a background element or of a cut side.
///
/// Quadratic shapes are accepted on ingest but are cut through their
/// corner-node linearization: the mid-side nodes do not influence the cut
/// geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    /// 4-node tetrahedron.
    Tet4,
    /// 10-node quadratic tetrahedron.
    Tet10,
    /// 8-node hexahedron.
    Hex8,
    /// 20-node quadratic hexahedron.
    Hex20,
    /// 27-node quadratic hexahedron.
    Hex27,
    /// 6-node wedge (triangular prism).
    Wedge6,
    /// 15-node quadratic wedge.
    Wedge15,
    /// 5-node pyramid.
    Pyramid5,
    /// 3-node triangle.
    Tri3,
    /// 6-node quadratic triangle.
    Tri6,
    /// 4-node quadrilateral.
    Quad4,
    /// 8-node quadratic quadrilateral.
    Quad8,
    /// 9-node quadratic quadrilateral.
    Quad9,
}

const TET4_EDGES: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];
const TET4_FACES: [&[usize]; 4] = [&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];
const TET4_TETS: [[usize; 4]; 1] = [[0, 1, 2, 3]];

const HEX8_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];
const HEX8_FACES: [&[usize]; 6] = [
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];
// Six tets around the 0-6 diagonal.
const HEX8_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

const WEDGE6_EDGES: [[usize; 2]; 9] = [
    [0, 1],
    [1, 2],
    [2, 0],
    [3, 4],
    [4, 5],
    [5, 3],
    [0, 3],
    [1, 4],
    [2, 5],
];
const WEDGE6_FACES: [&[usize]; 5] = [
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
    &[0, 2, 1],
    &[3, 4, 5],
];
const WEDGE6_TETS: [[usize; 4]; 3] = [[0, 1, 2, 3], [1, 2, 3, 4], [2, 3, 4, 5]];

const PYRAMID5_EDGES: [[usize; 2]; 8] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [0, 4],
    [1, 4],
    [2, 4],
    [3, 4],
];
const PYRAMID5_FACES: [&[usize]; 5] = [
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];
const PYRAMID5_TETS: [[usize; 4]; 2] = [[0, 1, 2, 4], [0, 2, 3, 4]];

impl CellType {
    /// Number of nodes carried by this shape (including mid-side nodes).
    pub fn node_count(self) -> usize {
        match self {
            CellType::Tet4 => 4,
            CellType::Tet10 => 10,
            CellType::Hex8 => 8,
            CellType::Hex20 => 20,
            CellType::Hex27 => 27,
            CellType::Wedge6 => 6,
            CellType::Wedge15 => 15,
            CellType::Pyramid5 => 5,
            CellType::Tri3 => 3,
            CellType::Tri6 => 6,
            CellType::Quad4 => 4,
            CellType::Quad8 => 8,
            CellType::Quad9 => 9,
        }
    }

    /// Number of corner nodes of the linearized shape.
    pub fn corner_count(self) -> usize {
        self.linearized().node_count()
    }

    /// The linear shape obtained by dropping mid-side nodes.
    pub fn linearized(self) -> CellType {
        match self {
            CellType::Tet10 => CellType::Tet4,
            CellType::Hex20 | CellType::Hex27 => CellType::Hex8,
            CellType::Wedge15 => CellType::Wedge6,
            CellType::Tri6 => CellType::Tri3,
            CellType::Quad8 | CellType::Quad9 => CellType::Quad4,
            other => other,
        }
    }

    /// True for volumetric (element) shapes.
    pub fn is_volume(self) -> bool {
        !self.is_surface()
    }

    /// True for surface (cut side) shapes.
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            CellType::Tri3 | CellType::Tri6 | CellType::Quad4 | CellType::Quad8 | CellType::Quad9
        )
    }

    /// The corner-node pairs forming the edges of the linearized shape.
    ///
    /// Panics for surface shapes of unknown topology — never happens for the
    /// shapes accepted on ingest.
    pub fn edges(self) -> &'static [[usize; 2]] {
        match self.linearized() {
            CellType::Tet4 => &TET4_EDGES,
            CellType::Hex8 => &HEX8_EDGES,
            CellType::Wedge6 => &WEDGE6_EDGES,
            CellType::Pyramid5 => &PYRAMID5_EDGES,
            CellType::Tri3 => &[[0, 1], [1, 2], [2, 0]],
            CellType::Quad4 => &[[0, 1], [1, 2], [2, 3], [3, 0]],
            _ => unreachable!("linearized() returns linear shapes only"),
        }
    }

    /// The faces of the linearized volume shape, as corner-index loops.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self.linearized() {
            CellType::Tet4 => &TET4_FACES,
            CellType::Hex8 => &HEX8_FACES,
            CellType::Wedge6 => &WEDGE6_FACES,
            CellType::Pyramid5 => &PYRAMID5_FACES,
            _ => &[],
        }
    }

    /// A tetrahedral decomposition of the linearized volume shape, used for
    /// the uncut fast path.
    pub fn tet_decomposition(self) -> &'static [[usize; 4]] {
        match self.linearized() {
            CellType::Tet4 => &TET4_TETS,
            CellType::Hex8 => &HEX8_TETS,
            CellType::Wedge6 => &WEDGE6_TETS,
            CellType::Pyramid5 => &PYRAMID5_TETS,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod test {
    use super::CellType;

    #[test]
    fn hex8_topology_is_consistent() {
        assert_eq!(CellType::Hex8.edges().len(), 12);
        assert_eq!(CellType::Hex8.faces().len(), 6);
        // Every edge appears in exactly two faces.
        for edge in CellType::Hex8.edges() {
            let mut count = 0;
            for face in CellType::Hex8.faces() {
                for i in 0..face.len() {
                    let a = face[i];
                    let b = face[(i + 1) % face.len()];
                    if (a == edge[0] && b == edge[1]) || (a == edge[1] && b == edge[0]) {
                        count += 1;
                    }
                }
            }
            assert_eq!(count, 2, "edge {:?} not shared by two faces", edge);
        }
    }

    #[test]
    fn quadratic_shapes_linearize() {
        assert_eq!(CellType::Hex20.linearized(), CellType::Hex8);
        assert_eq!(CellType::Tet10.corner_count(), 4);
        assert_eq!(CellType::Quad9.linearized(), CellType::Quad4);
    }
}
