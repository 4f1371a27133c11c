use crate::poly_data::{Cell, CellKind, PointId, PolyData};

/// Keep the surface cells whose points all have a non-zero `mask_name` value,
/// then drop unreferenced points. Polygons are fan-triangulated so the result
/// is a pure triangle surface. A missing mask keeps nothing.
pub fn threshold_valid(input: &PolyData, mask_name: &str) -> PolyData {
    let Some(mask) = input.point_data.get(mask_name) else {
        log::warn!("Threshold: no '{}' array, output is empty", mask_name);
        return PolyData::default();
    };

    let mut old_to_new: Vec<Option<PointId>> = vec![None; input.num_points()];
    let mut kept: Vec<PointId> = Vec::new();
    let mut cells = Vec::new();

    for cell in &input.cells {
        if !matches!(cell.kind, CellKind::Triangle | CellKind::Polygon) || cell.len() < 3 {
            continue;
        }
        if cell.point_ids.iter().any(|&id| mask[id] == 0.0) {
            continue;
        }

        let mut remap = |id: PointId| {
            *old_to_new[id].get_or_insert_with(|| {
                kept.push(id);
                kept.len() - 1
            })
        };
        let ids: Vec<PointId> = cell.point_ids.iter().map(|&id| remap(id)).collect();
        for w in 1..ids.len() - 1 {
            cells.push(Cell::triangle(ids[0], ids[w], ids[w + 1]));
        }
    }

    log::debug!(
        "Threshold: kept {}/{} cells, {}/{} points",
        cells.len(),
        input.num_cells(),
        kept.len(),
        input.num_points()
    );

    let points = kept.iter().map(|&id| input.points[id]).collect();
    let mut output = PolyData::new(points, cells);
    output.point_data = input.point_data.select(&kept);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3D;

    #[test]
    fn test_drops_cells_touching_invalid_points() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
            Point3D::new(1.0, 1.0, 0.0),
            Point3D::new(2.0, 1.0, 0.0),
        ];
        let mut input = PolyData::new(points, vec![Cell::triangle(0, 1, 2), Cell::triangle(1, 3, 4)]);
        input.point_data.insert("mask", vec![1.0, 1.0, 1.0, 1.0, 0.0]);
        input.point_data.insert("v", vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        let output = threshold_valid(&input, "mask");
        assert_eq!(output.num_cells(), 1);
        assert_eq!(output.num_points(), 3);
        assert_eq!(output.point_data.get("v"), Some(&[0.0, 1.0, 2.0][..]));
    }

    #[test]
    fn test_missing_mask() {
        let input = PolyData::new(vec![Point3D::origin(); 3], vec![Cell::triangle(0, 1, 2)]);
        assert!(threshold_valid(&input, "mask").is_empty());
    }
}
