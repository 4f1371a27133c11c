// Polyline stitching: rebuild one connected poly-line from an unordered set of
// line / poly-line cells.
//
// Algorithm:
//   1. Start from cell 0, traversed forward.
//   2. Each pass tries one extension at the front and one at the back. A
//      candidate is the lowest-indexed unused line cell whose first or last
//      point is the current endpoint; it is oriented so that endpoint becomes
//      the shared joint.
//   3. Stop after a pass that adds nothing.
//   4. Concatenate the pieces, dropping the repeated joint point of every
//      piece after the first.
//
// A cell is used at most once, so cycles terminate after one loop and branches
// follow the first match in array order.

use crate::poly_data::{Cell, CellKind, PointId, PolyData};
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StitchError {
    #[error("input contains no cells")]
    EmptyInput,

    #[error("cell 0 is a {kind}, expected a line or poly-line")]
    InvalidInputKind { kind: CellKind },

    #[error("cell 0 has {len} point(s), need at least 2")]
    DegenerateCell { len: usize },

    #[error("cell {cell} references point {id} but only {num_points} points exist")]
    InvalidPointId {
        cell: usize,
        id: PointId,
        num_points: usize,
    },
}

/// A directed reference to one input cell.
///
/// Equality and hashing only look at `cell`, so the same cell in both
/// orientations counts as one piece.
#[derive(Debug, Clone, Copy)]
pub struct LinePiece {
    pub cell: usize,
    pub forward: bool,
}

impl LinePiece {
    pub fn new(cell: usize, forward: bool) -> Self {
        Self { cell, forward }
    }

    /// First point in traversal order
    fn start(&self, cells: &[Cell]) -> PointId {
        let ids = &cells[self.cell].point_ids;
        if self.forward {
            ids[0]
        } else {
            ids[ids.len() - 1]
        }
    }

    /// Last point in traversal order
    fn end(&self, cells: &[Cell]) -> PointId {
        let ids = &cells[self.cell].point_ids;
        if self.forward {
            ids[ids.len() - 1]
        } else {
            ids[0]
        }
    }
}

impl PartialEq for LinePiece {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for LinePiece {}

impl Hash for LinePiece {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
}

/// Summary of one stitch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StitchReport {
    pub pieces_used: usize,
    pub cells_unused: usize,
    pub points_emitted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PolylineStitcher;

impl PolylineStitcher {
    pub fn new() -> Self {
        Self
    }

    /// Stitch `input` into a single poly-line sharing its point collection
    pub fn stitch(&self, input: &PolyData) -> Result<PolyData, StitchError> {
        let (output, report) = self.stitch_with_report(input)?;
        log::debug!(
            "Stitched {} piece(s) into {} points ({} cell(s) unused)",
            report.pieces_used,
            report.points_emitted,
            report.cells_unused
        );
        Ok(output)
    }

    pub fn stitch_with_report(&self, input: &PolyData) -> Result<(PolyData, StitchReport), StitchError> {
        let pieces = self.stitch_pieces(input)?;
        let ids = concatenate(&input.cells, &pieces);

        let report = StitchReport {
            pieces_used: pieces.len(),
            cells_unused: input.cells.len() - pieces.len(),
            points_emitted: ids.len(),
        };

        let mut output = PolyData::with_shared_points(input.points.clone(), vec![Cell::poly_line(ids)]);
        output.point_data = input.point_data.clone();
        Ok((output, report))
    }

    /// Ordered traversal list, front to back
    pub fn stitch_pieces(&self, input: &PolyData) -> Result<Vec<LinePiece>, StitchError> {
        let cells = &input.cells;
        let first = cells.first().ok_or(StitchError::EmptyInput)?;
        if !first.kind.is_line() {
            return Err(StitchError::InvalidInputKind { kind: first.kind });
        }
        if first.len() < 2 {
            return Err(StitchError::DegenerateCell { len: first.len() });
        }
        check_point_ids(input)?;

        let mut pieces = VecDeque::from([LinePiece::new(0, true)]);
        let mut used: HashSet<usize> = HashSet::from([0]);

        loop {
            let mut found = false;

            let front_point = pieces[0].start(cells);
            if let Some(piece) = find_extension(cells, front_point, &used, Side::Front) {
                used.insert(piece.cell);
                pieces.push_front(piece);
                found = true;
            }

            let back_point = pieces[pieces.len() - 1].end(cells);
            if let Some(piece) = find_extension(cells, back_point, &used, Side::Back) {
                used.insert(piece.cell);
                pieces.push_back(piece);
                found = true;
            }

            if !found {
                break;
            }
        }

        Ok(pieces.into())
    }
}

/// Convenience wrapper around `PolylineStitcher::stitch`
pub fn stitch(input: &PolyData) -> Result<PolyData, StitchError> {
    PolylineStitcher::new().stitch(input)
}

pub(crate) fn check_point_ids(input: &PolyData) -> Result<(), StitchError> {
    let num_points = input.num_points();
    for (cell_idx, cell) in input.cells.iter().enumerate() {
        if !cell.kind.is_line() {
            continue;
        }
        if let Some(&id) = cell.point_ids.iter().find(|&&id| id >= num_points) {
            return Err(StitchError::InvalidPointId {
                cell: cell_idx,
                id,
                num_points,
            });
        }
    }
    Ok(())
}

/// First unused line cell touching `point`, oriented to join at `point`
fn find_extension(cells: &[Cell], point: PointId, used: &HashSet<usize>, side: Side) -> Option<LinePiece> {
    cells.iter().enumerate().find_map(|(idx, cell)| {
        if used.contains(&idx) || !cell.kind.is_line() || cell.len() < 2 {
            return None;
        }
        let (first, last) = (cell.point_ids[0], cell.point_ids[cell.len() - 1]);

        match side {
            // New front piece must end at `point`
            Side::Front if last == point => Some(LinePiece::new(idx, true)),
            Side::Front if first == point => Some(LinePiece::new(idx, false)),
            // New back piece must start at `point`
            Side::Back if first == point => Some(LinePiece::new(idx, true)),
            Side::Back if last == point => Some(LinePiece::new(idx, false)),
            _ => None,
        }
    })
}

fn concatenate(cells: &[Cell], pieces: &[LinePiece]) -> Vec<PointId> {
    let total = 1 + pieces.iter().map(|p| cells[p.cell].len() - 1).sum::<usize>();
    let mut ids = Vec::with_capacity(total);

    for (n, piece) in pieces.iter().enumerate() {
        let skip = usize::from(n > 0);
        let point_ids = &cells[piece.cell].point_ids;
        if piece.forward {
            ids.extend(point_ids.iter().skip(skip));
        } else {
            ids.extend(point_ids.iter().rev().skip(skip));
        }
    }

    ids
}
