// Resample line attributes onto the points of another dataset.
//
// Each target point takes the values of its nearest source segment,
// interpolated at the closest point. Points farther than `tolerance` from every
// segment get zeros and are flagged invalid in the mask array.

use crate::geometry::{LineSegment, Point3D};
use crate::poly_data::{PointData, PointId, PolyData};
use rayon::prelude::*;

/// Name of the per-point validity array written by the probe
pub const VALID_MASK_ARRAY: &str = "vtkValidPointMask";

#[derive(Debug, Clone, Copy)]
struct Sample {
    a: PointId,
    b: PointId,
    t: f64,
}

/// Probe `source` line arrays at every point of `target`.
/// The result has the target's geometry and cells, and the source's arrays
/// plus the validity mask as point data.
pub fn probe_lines(source: &PolyData, target: &PolyData, tolerance: f64) -> PolyData {
    let segments: Vec<(PointId, PointId, LineSegment)> = source
        .cells
        .iter()
        .filter(|c| c.kind.is_line())
        .flat_map(|c| c.point_ids.windows(2).map(|w| (w[0], w[1])).collect::<Vec<_>>())
        .map(|(a, b)| (a, b, LineSegment::new(source.points[a], source.points[b])))
        .collect();

    let samples: Vec<Option<Sample>> = target
        .points
        .par_iter()
        .map(|p| nearest(&segments, p, tolerance))
        .collect();

    let mut point_data = PointData::new();
    for array in source.point_data.iter() {
        let values = samples
            .iter()
            .map(|s| match s {
                Some(Sample { a, b, t }) => array.values[*a] + t * (array.values[*b] - array.values[*a]),
                None => 0.0,
            })
            .collect();
        point_data.insert(array.name.clone(), values);
    }

    let mask: Vec<f64> = samples.iter().map(|s| if s.is_some() { 1.0 } else { 0.0 }).collect();
    let valid = mask.iter().filter(|&&m| m > 0.0).count();
    point_data.insert(VALID_MASK_ARRAY, mask);

    log::debug!(
        "Probe: {}/{} points within tolerance {}",
        valid,
        target.num_points(),
        tolerance
    );

    let mut output = PolyData::with_shared_points(target.points.clone(), target.cells.clone());
    output.point_data = point_data;
    output
}

fn nearest(segments: &[(PointId, PointId, LineSegment)], p: &Point3D, tolerance: f64) -> Option<Sample> {
    let mut best: Option<(f64, Sample)> = None;
    for &(a, b, seg) in segments {
        let (t, dist) = seg.closest_point(p);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, Sample { a, b, t }));
        }
    }
    best.filter(|(d, _)| *d <= tolerance).map(|(_, s)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly_data::Cell;
    use approx::assert_relative_eq;

    fn source_line() -> PolyData {
        let mut line = PolyData::new(
            vec![
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(2.0, 0.0, 0.0),
                Point3D::new(2.0, 2.0, 0.0),
            ],
            vec![Cell::poly_line(vec![0, 1, 2])],
        );
        line.point_data.insert("s", vec![0.0, 2.0, 4.0]);
        line
    }

    #[test]
    fn test_interpolates_nearest_segment() {
        let target = PolyData::new(
            vec![
                Point3D::new(1.0, 0.05, 0.0),
                Point3D::new(2.0, 1.5, 0.0),
                Point3D::new(5.0, 5.0, 0.0),
            ],
            Vec::new(),
        );
        let probed = probe_lines(&source_line(), &target, 0.1);

        let s = probed.point_data.get("s").unwrap();
        assert_relative_eq!(s[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(s[1], 3.5, epsilon = 1e-12);
        assert_eq!(s[2], 0.0);

        assert_eq!(probed.point_data.get(VALID_MASK_ARRAY), Some(&[1.0, 1.0, 0.0][..]));
        assert!(std::sync::Arc::ptr_eq(&probed.points, &target.points));
    }

    #[test]
    fn test_empty_source_marks_everything_invalid() {
        let target = PolyData::new(vec![Point3D::origin(); 3], Vec::new());
        let probed = probe_lines(&PolyData::default(), &target, 1.0);
        assert_eq!(probed.point_data.get(VALID_MASK_ARRAY), Some(&[0.0, 0.0, 0.0][..]));
    }
}
