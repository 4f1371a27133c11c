// Merge coincident points of a line dataset.
//
// Points are bucketed on a lattice of spacing `tolerance`; the first point of a
// bucket represents it. Cells are remapped, repeated consecutive ids removed,
// and line cells left with fewer than two ids are dropped.

use crate::geometry::Point3D;
use crate::poly_data::{Cell, PointId, PolyData};
use std::collections::HashMap;

/// Discretized point key for hash map (handles floating point comparison)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PointKey {
    x: i64,
    y: i64,
    z: i64,
}

impl PointKey {
    fn from_point(point: &Point3D, tolerance: f64) -> Self {
        let scale = 1.0 / tolerance;
        Self {
            x: (point.x * scale).round() as i64,
            y: (point.y * scale).round() as i64,
            z: (point.z * scale).round() as i64,
        }
    }
}

pub fn clean_lines(input: &PolyData, tolerance: f64) -> PolyData {
    let tolerance = tolerance.max(1e-12);

    let mut key_to_new: HashMap<PointKey, PointId> = HashMap::new();
    let mut old_to_new: Vec<Option<PointId>> = vec![None; input.num_points()];
    let mut representatives: Vec<PointId> = Vec::new();

    // Only referenced points survive, numbered in first-use order
    for cell in &input.cells {
        for &id in &cell.point_ids {
            if old_to_new[id].is_some() {
                continue;
            }
            let key = PointKey::from_point(&input.points[id], tolerance);
            let new_id = *key_to_new.entry(key).or_insert_with(|| {
                representatives.push(id);
                representatives.len() - 1
            });
            old_to_new[id] = Some(new_id);
        }
    }

    let mut dropped = 0usize;
    let cells: Vec<Cell> = input
        .cells
        .iter()
        .filter_map(|cell| {
            let mut ids: Vec<PointId> = cell.point_ids.iter().filter_map(|&id| old_to_new[id]).collect();
            ids.dedup();
            if cell.kind.is_line() && ids.len() < 2 {
                dropped += 1;
                return None;
            }
            Some(Cell::new(cell.kind, ids))
        })
        .collect();

    let points: Vec<Point3D> = representatives.iter().map(|&id| input.points[id]).collect();

    log::debug!(
        "Clean: {} -> {} points, {} collapsed cell(s) dropped",
        input.num_points(),
        points.len(),
        dropped
    );

    let mut output = PolyData::new(points, cells);
    output.point_data = input.point_data.select(&representatives);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_coincident_points() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(1.0 + 1e-9, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
        ];
        let input = PolyData::new(points, vec![Cell::line(0, 1), Cell::line(2, 3)]);
        let cleaned = clean_lines(&input, 1e-6);

        assert_eq!(cleaned.num_points(), 3);
        assert_eq!(cleaned.cells[0].point_ids, vec![0, 1]);
        assert_eq!(cleaned.cells[1].point_ids, vec![1, 2]);
    }

    #[test]
    fn test_drops_collapsed_lines_and_unused_points() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(5.0, 5.0, 5.0),
            Point3D::new(1.0, 0.0, 0.0),
        ];
        let mut input = PolyData::new(points, vec![Cell::line(0, 1), Cell::poly_line(vec![0, 1, 3])]);
        input.point_data.insert("v", vec![10.0, 11.0, 12.0, 13.0]);

        let cleaned = clean_lines(&input, 1e-6);
        assert_eq!(cleaned.cells.len(), 1);
        assert_eq!(cleaned.cells[0].point_ids, vec![0, 1]);
        assert_eq!(cleaned.num_points(), 2);
        assert_eq!(cleaned.point_data.get("v"), Some(&[10.0, 13.0][..]));
    }
}
