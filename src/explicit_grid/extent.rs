use super::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open logical cell range `[iMin,iMax) x [jMin,jMax) x [kMin,kMax)`,
/// stored in VTK extent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent(pub [i32; 6]);

impl Extent {
    pub fn new(i_min: i32, i_max: i32, j_min: i32, j_max: i32, k_min: i32, k_max: i32) -> Self {
        Self([i_min, i_max, j_min, j_max, k_min, k_max])
    }

    pub fn i_min(&self) -> i32 {
        self.0[0]
    }
    pub fn i_max(&self) -> i32 {
        self.0[1]
    }
    pub fn j_min(&self) -> i32 {
        self.0[2]
    }
    pub fn j_max(&self) -> i32 {
        self.0[3]
    }
    pub fn k_min(&self) -> i32 {
        self.0[4]
    }
    pub fn k_max(&self) -> i32 {
        self.0[5]
    }

    /// Every axis must hold at least one cell
    pub fn validate(&self) -> Result<(), GridError> {
        for (axis, name) in ["i", "j", "k"].iter().enumerate() {
            let (lo, hi) = (self.0[2 * axis], self.0[2 * axis + 1]);
            if lo >= hi {
                return Err(GridError::InvalidExtent {
                    extent: *self,
                    reason: format!("{name}Min ({lo}) must be less than {name}Max ({hi})"),
                });
            }
        }
        Ok(())
    }

    /// Number of cells along i, j, k (zero for inverted axes)
    pub fn cell_dims(&self) -> [usize; 3] {
        [
            (self.i_max() - self.i_min()).max(0) as usize,
            (self.j_max() - self.j_min()).max(0) as usize,
            (self.k_max() - self.k_min()).max(0) as usize,
        ]
    }

    pub fn num_cells(&self) -> usize {
        let [ni, nj, nk] = self.cell_dims();
        ni * nj * nk
    }

    pub fn contains(&self, other: &Extent) -> bool {
        (0..3).all(|axis| self.0[2 * axis] <= other.0[2 * axis] && other.0[2 * axis + 1] <= self.0[2 * axis + 1])
    }

    pub fn contains_cell(&self, i: i32, j: i32, k: i32) -> bool {
        (self.i_min()..self.i_max()).contains(&i)
            && (self.j_min()..self.j_max()).contains(&j)
            && (self.k_min()..self.k_max()).contains(&k)
    }

    /// Dense index with i varying fastest
    pub fn cell_index(&self, i: i32, j: i32, k: i32) -> Option<usize> {
        if !self.contains_cell(i, j, k) {
            return None;
        }
        let [ni, nj, _] = self.cell_dims();
        let (di, dj, dk) = (
            (i - self.i_min()) as usize,
            (j - self.j_min()) as usize,
            (k - self.k_min()) as usize,
        );
        Some(di + dj * ni + dk * ni * nj)
    }

    /// Inverse of `cell_index`
    pub fn cell_coords(&self, index: usize) -> [i32; 3] {
        let [ni, nj, _] = self.cell_dims();
        let di = index % ni;
        let dj = (index / ni) % nj;
        let dk = index / (ni * nj);
        [
            self.i_min() + di as i32,
            self.j_min() + dj as i32,
            self.k_min() + dk as i32,
        ]
    }

    /// Cell coordinates in dense-index order
    pub fn cells(&self) -> impl Iterator<Item = [i32; 3]> + '_ {
        (0..self.num_cells()).map(move |idx| self.cell_coords(idx))
    }

    /// Split into `num_pieces` slabs along the longest axis and return slab
    /// `piece`. Returns `None` when the piece is out of range or would be empty.
    pub fn split(&self, piece: usize, num_pieces: usize) -> Option<Extent> {
        if num_pieces == 0 || piece >= num_pieces {
            return None;
        }
        let dims = self.cell_dims();
        let axis = (0..3).max_by_key(|&a| (dims[a], std::cmp::Reverse(a)))?;

        let len = dims[axis];
        let start = self.0[2 * axis] as usize;
        let lo = start + len * piece / num_pieces;
        let hi = start + len * (piece + 1) / num_pieces;
        if lo >= hi {
            return None;
        }

        let mut out = *self;
        out.0[2 * axis] = lo as i32;
        out.0[2 * axis + 1] = hi as i32;
        Some(out)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{})x[{},{})x[{},{})",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Extent::new(0, 2, 0, 2, 0, 2).validate().is_ok());
        assert!(matches!(
            Extent::new(0, 0, 0, 10, 0, 10).validate(),
            Err(GridError::InvalidExtent { .. })
        ));
        assert!(Extent::new(0, 1, 5, 4, 0, 1).validate().is_err());
    }

    #[test]
    fn test_cell_index_round_trip_order() {
        let ext = Extent::new(1, 3, 0, 2, 5, 7);
        assert_eq!(ext.num_cells(), 8);
        assert_eq!(ext.cell_index(1, 0, 5), Some(0));
        assert_eq!(ext.cell_index(2, 0, 5), Some(1));
        assert_eq!(ext.cell_index(1, 1, 5), Some(2));
        assert_eq!(ext.cell_index(1, 0, 6), Some(4));
        assert_eq!(ext.cell_index(3, 0, 5), None);

        let coords: Vec<_> = ext.cells().collect();
        assert_eq!(coords[3], [2, 1, 5]);
        assert_eq!(coords.len(), 8);
    }

    #[test]
    fn test_contains() {
        let whole = Extent::new(0, 10, 0, 10, 0, 10);
        assert!(whole.contains(&Extent::new(2, 4, 0, 10, 9, 10)));
        assert!(!whole.contains(&Extent::new(-1, 4, 0, 10, 0, 10)));
    }

    #[test]
    fn test_split_covers_longest_axis() {
        let whole = Extent::new(0, 4, 0, 10, 0, 3);
        let pieces: Vec<_> = (0..3).filter_map(|p| whole.split(p, 3)).collect();

        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], Extent::new(0, 4, 0, 3, 0, 3));
        assert_eq!(pieces[2], Extent::new(0, 4, 6, 10, 0, 3));
        assert_eq!(pieces.iter().map(|p| p.num_cells()).sum::<usize>(), whole.num_cells());

        assert!(whole.split(3, 3).is_none());
        // One cell cannot feed two pieces
        let single = Extent::new(0, 1, 0, 1, 0, 1);
        assert!(single.split(0, 2).is_none());
        assert_eq!(single.split(1, 2), Some(single));
    }
}
