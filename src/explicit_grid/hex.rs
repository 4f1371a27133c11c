// Explicit structured grid of hexahedra.
//
// Cells are addressed by logical (i, j, k) over an extent; each cell is either
// present with its own eight point ids or blanked. Neighbouring cells are free
// to reference distinct points, which is how faults are represented.

use super::Extent;
use crate::geometry::Point3D;
use crate::poly_data::{PointData, PointId};
use crate::slicing::Volume;
use std::sync::Arc;

/// Corner ids of one hexahedron: the bottom quad counter-clockwise seen from
/// above, then the top quad in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexCorners {
    pub bottom: [PointId; 4],
    pub top: [PointId; 4],
}

impl HexCorners {
    pub fn new(bottom: [PointId; 4], top: [PointId; 4]) -> Self {
        Self { bottom, top }
    }

    /// All eight ids in VTK hexahedron order
    pub fn ids(&self) -> [PointId; 8] {
        let [b0, b1, b2, b3] = self.bottom;
        let [t0, t1, t2, t3] = self.top;
        [b0, b1, b2, b3, t0, t1, t2, t3]
    }

    /// The four ids bounding `face`
    pub fn face(&self, face: Face) -> [PointId; 4] {
        let [b0, b1, b2, b3] = self.bottom;
        let [t0, t1, t2, t3] = self.top;
        match face {
            Face::IMin => [b0, b3, t3, t0],
            Face::IMax => [b1, b2, t2, t1],
            Face::JMin => [b0, b1, t1, t0],
            Face::JMax => [b3, b2, t2, t3],
            Face::KMin => [b0, b1, b2, b3],
            Face::KMax => [t0, t1, t2, t3],
        }
    }
}

/// Hexahedron faces, in connectivity-flag bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    IMin,
    IMax,
    JMin,
    JMax,
    KMin,
    KMax,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::IMin, Face::IMax, Face::JMin, Face::JMax, Face::KMin, Face::KMax];

    pub fn opposite(self) -> Face {
        match self {
            Face::IMin => Face::IMax,
            Face::IMax => Face::IMin,
            Face::JMin => Face::JMax,
            Face::JMax => Face::JMin,
            Face::KMin => Face::KMax,
            Face::KMax => Face::KMin,
        }
    }

    /// Logical offset to the neighbour across this face
    pub fn offset(self) -> [i32; 3] {
        match self {
            Face::IMin => [-1, 0, 0],
            Face::IMax => [1, 0, 0],
            Face::JMin => [0, -1, 0],
            Face::JMax => [0, 1, 0],
            Face::KMin => [0, 0, -1],
            Face::KMax => [0, 0, 1],
        }
    }

    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Present(HexCorners),
    Blanked,
}

impl CellState {
    pub fn corners(&self) -> Option<&HexCorners> {
        match self {
            CellState::Present(c) => Some(c),
            CellState::Blanked => None,
        }
    }

    pub fn is_blanked(&self) -> bool {
        matches!(self, CellState::Blanked)
    }
}

/// Per-cell attribute arrays, indexed like `HexGrid::cells`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    /// Euclidean norm of (i, j, k); 0 for blanked cells
    pub distance_to_origin: Vec<f64>,
    pub rank: Vec<i32>,
    pub coordinates: Vec<[i32; 3]>,
    /// Only written by the pillar generator
    pub object_id: Option<Vec<i32>>,
}

impl CellData {
    pub(crate) fn with_len(n: usize) -> Self {
        Self {
            distance_to_origin: vec![0.0; n],
            rank: vec![0; n],
            coordinates: vec![[0; 3]; n],
            object_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HexGrid {
    extent: Extent,
    points: Arc<Vec<Point3D>>,
    cells: Vec<CellState>,
    cell_data: CellData,
}

impl HexGrid {
    pub(crate) fn from_parts(extent: Extent, points: Vec<Point3D>, cells: Vec<CellState>, cell_data: CellData) -> Self {
        Self {
            extent,
            points: Arc::new(points),
            cells,
            cell_data,
        }
    }

    pub(crate) fn set_object_id(&mut self, ids: Vec<i32>) {
        self.cell_data.object_id = Some(ids);
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn shared_points(&self) -> Arc<Vec<Point3D>> {
        Arc::clone(&self.points)
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// All cell states in dense-index order
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn cell(&self, i: i32, j: i32, k: i32) -> Option<&CellState> {
        self.extent.cell_index(i, j, k).map(|idx| &self.cells[idx])
    }

    pub fn cell_data(&self) -> &CellData {
        &self.cell_data
    }

    /// Present cells with their logical coordinates
    pub fn present_cells(&self) -> impl Iterator<Item = ([i32; 3], &HexCorners)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(idx, state)| state.corners().map(|c| (self.extent.cell_coords(idx), c)))
    }

    pub fn num_present_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blanked()).count()
    }

    pub fn num_blanked_cells(&self) -> usize {
        self.cells.len() - self.num_present_cells()
    }

    /// Axis-aligned bounds over all points
    pub fn bounds(&self) -> Option<(Point3D, Point3D)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(min, max), p| {
            (
                Point3D::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Point3D::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// One byte per cell, bit `Face::bit()` set when the neighbour across that
    /// face is present and shares the same four point ids.
    pub fn face_connectivity(&self) -> Vec<u8> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, state)| {
                let Some(corners) = state.corners() else {
                    return 0;
                };
                let [i, j, k] = self.extent.cell_coords(idx);

                Face::ALL.iter().fold(0u8, |flags, &face| {
                    let [di, dj, dk] = face.offset();
                    let neighbour = self.cell(i + di, j + dj, k + dk).and_then(CellState::corners);
                    match neighbour {
                        Some(other) if same_face(corners.face(face), other.face(face.opposite())) => {
                            flags | face.bit()
                        }
                        _ => flags,
                    }
                })
            })
            .collect()
    }

    /// Present cells as a volume for slicing, sharing this grid's points
    pub fn to_volume(&self, point_data: PointData) -> Volume {
        Volume {
            points: self.shared_points(),
            cells: self.present_cells().map(|(_, c)| c.ids()).collect(),
            point_data,
        }
    }
}

fn same_face(mut a: [PointId; 4], mut b: [PointId; 4]) -> bool {
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cell_grid(shared: bool) -> HexGrid {
        // Two cells along i; the second either reuses the shared face or not
        let extent = Extent::new(0, 2, 0, 1, 0, 1);
        let points = vec![Point3D::origin(); 16];
        let a = HexCorners::new([0, 1, 2, 3], [4, 5, 6, 7]);
        let b = if shared {
            HexCorners::new([1, 8, 9, 2], [5, 10, 11, 6])
        } else {
            HexCorners::new([12, 8, 9, 13], [14, 10, 11, 15])
        };
        HexGrid::from_parts(
            extent,
            points,
            vec![CellState::Present(a), CellState::Present(b)],
            CellData::with_len(2),
        )
    }

    #[test]
    fn test_faces_share_ids() {
        let c = HexCorners::new([0, 1, 2, 3], [4, 5, 6, 7]);
        assert_eq!(c.face(Face::KMin), [0, 1, 2, 3]);
        assert_eq!(c.face(Face::IMax), [1, 2, 6, 5]);
        assert_eq!(c.ids(), [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_face_connectivity() {
        let flags = two_cell_grid(true).face_connectivity();
        assert_eq!(flags, vec![Face::IMax.bit(), Face::IMin.bit()]);

        let flags = two_cell_grid(false).face_connectivity();
        assert_eq!(flags, vec![0, 0]);
    }

    #[test]
    fn test_present_cells_and_volume() {
        let mut grid = two_cell_grid(true);
        grid.cells[1] = CellState::Blanked;

        assert_eq!(grid.num_present_cells(), 1);
        assert_eq!(grid.num_blanked_cells(), 1);
        let present: Vec<_> = grid.present_cells().map(|(ijk, _)| ijk).collect();
        assert_eq!(present, vec![[0, 0, 0]]);

        let volume = grid.to_volume(PointData::new());
        assert_eq!(volume.cells.len(), 1);
        assert!(Arc::ptr_eq(&volume.points, &grid.points));
    }
}
