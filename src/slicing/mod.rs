// Slicing a volume along a poly-line
//
// Pipeline:
//   1. Clean the raw line (merge coincident points)
//   2. Stitch it into one poly-line
//   3. Sweep the poly-line along z into a poly-plane
//   4. Cut the volume with the poly-plane
//   5. Flatten cut and line onto z = 0
//   6. Attach arc length to the flattened line
//   7. Probe line attributes onto the flattened cut
//   8. Keep the validly probed part as a triangle surface
//   9. Drop the bookkeeping arrays

pub mod clean;
pub mod cutter;
pub mod kernel;
pub mod poly_plane;
pub mod probe;
pub mod threshold;

pub use cutter::FUNCTION_VALUES_ARRAY;
pub use kernel::{DefaultKernel, GeometryKernel};
pub use poly_plane::PolyPlane;
pub use probe::VALID_MASK_ARRAY;

use crate::geometry::Point3D;
use crate::poly_data::{Cell, PointData, PointId, PolyData};
use crate::stitch::{PolylineStitcher, StitchError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cumulative distance along the flattened line
pub const ARC_LENGTH_ARRAY: &str = "arc_length";

/// Hexahedral volume to be sliced.
///
/// Corner order per cell: bottom face counter-clockwise, then the top face
/// in the same order.
#[derive(Debug, Clone, Default)]
pub struct Volume {
    pub points: Arc<Vec<Point3D>>,
    pub cells: Vec<[PointId; 8]>,
    pub point_data: PointData,
}

impl Volume {
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn validate(&self) -> Result<(), SliceError> {
        if self.cells.is_empty() {
            return Err(SliceError::EmptyVolume);
        }
        let num_points = self.num_points();
        for (cell, ids) in self.cells.iter().enumerate() {
            if let Some(&id) = ids.iter().find(|&&id| id >= num_points) {
                return Err(SliceError::InvalidVolume(format!(
                    "cell {} references point {} but only {} points exist",
                    cell, id, num_points
                )));
            }
        }
        for array in self.point_data.iter() {
            if array.values.len() != num_points {
                return Err(SliceError::InvalidVolume(format!(
                    "array '{}' has {} values for {} points",
                    array.name,
                    array.values.len(),
                    num_points
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Maximum XY distance between a cut point and the line for the point
    /// to keep probed attributes
    pub tolerance: f64,

    /// Merge distance for coincident line points
    pub clean_tolerance: f64,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            clean_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SliceError {
    #[error("could not stitch line: {0}")]
    Stitch(#[from] StitchError),

    #[error("volume has no cells")]
    EmptyVolume,

    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("invalid line: {0}")]
    InvalidLine(String),

    #[error("stitched line has no extent in the XY plane")]
    DegenerateLine,
}

/// Cell ids of every kind and array lengths must match the line's points
fn validate_line(line: &PolyData) -> Result<(), SliceError> {
    let num_points = line.num_points();
    for (cell, c) in line.cells.iter().enumerate() {
        if let Some(&id) = c.point_ids.iter().find(|&&id| id >= num_points) {
            return Err(SliceError::InvalidLine(format!(
                "{} cell {} references point {} but only {} points exist",
                c.kind, cell, id, num_points
            )));
        }
    }
    for array in line.point_data.iter() {
        if array.values.len() != num_points {
            return Err(SliceError::InvalidLine(format!(
                "array '{}' has {} values for {} points",
                array.name,
                array.values.len(),
                num_points
            )));
        }
    }
    Ok(())
}

pub struct SliceDriver {
    config: SliceConfig,
    kernel: Box<dyn GeometryKernel>,
    stitcher: PolylineStitcher,
}

impl Default for SliceDriver {
    fn default() -> Self {
        Self::new(SliceConfig::default())
    }
}

impl SliceDriver {
    pub fn new(config: SliceConfig) -> Self {
        Self {
            config,
            kernel: Box::new(DefaultKernel),
            stitcher: PolylineStitcher::new(),
        }
    }

    pub fn with_kernel(mut self, kernel: impl GeometryKernel + 'static) -> Self {
        self.kernel = Box::new(kernel);
        self
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// Slice with the configured tolerance
    pub fn slice(&self, volume: &Volume, raw_line: &PolyData) -> Result<PolyData, SliceError> {
        self.slice_with_tolerance(volume, raw_line, self.config.tolerance)
    }

    pub fn slice_with_tolerance(
        &self,
        volume: &Volume,
        raw_line: &PolyData,
        tolerance: f64,
    ) -> Result<PolyData, SliceError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SliceError::InvalidTolerance(tolerance));
        }
        volume.validate()?;
        if raw_line.cells.is_empty() {
            return Err(StitchError::EmptyInput.into());
        }
        crate::stitch::check_point_ids(raw_line)?;
        validate_line(raw_line)?;

        log::info!("=== Poly-plane slice started ===");

        log::info!("Step 1/9: Cleaning {} line points...", raw_line.num_points());
        let cleaned = self.kernel.clean(raw_line, self.config.clean_tolerance);

        log::info!("Step 2/9: Stitching {} cells...", cleaned.num_cells());
        let stitched = self.stitcher.stitch(&cleaned)?;

        log::info!("Step 3/9: Building poly-plane...");
        let plane = self.kernel.poly_plane(&stitched).ok_or(SliceError::DegenerateLine)?;
        log::info!("  → {} segments", plane.segments().len());

        log::info!("Step 4/9: Cutting {} cells...", volume.num_cells());
        let cut = self.kernel.cut(volume, &plane);
        if cut.is_empty() {
            log::warn!("Poly-plane does not intersect the volume, returning an empty surface");
            return Ok(PolyData::default());
        }
        log::info!("  → {} triangles", cut.num_cells());

        log::info!("Step 5/9: Flattening...");
        let flat_cut = flatten(&cut);
        let mut flat_line = flatten_polyline(&stitched);

        log::info!("Step 6/9: Computing arc length...");
        let arc = arc_length(&flat_line.points);
        log::info!("  → line length {:.3}", arc.last().copied().unwrap_or(0.0));
        flat_line.point_data.insert(ARC_LENGTH_ARRAY, arc);

        log::info!("Step 7/9: Probing line attributes (tolerance {})...", tolerance);
        let probed = self.kernel.probe(&flat_line, &flat_cut, tolerance);
        // Flattening keeps point ids, so probed arrays apply to the 3D cut as is
        let mut merged = cut;
        for array in probed.point_data.iter() {
            merged.point_data.insert(array.name.clone(), array.values.clone());
        }

        log::info!("Step 8/9: Keeping valid samples...");
        let mut surface = self.kernel.threshold(&merged, VALID_MASK_ARRAY);

        log::info!("Step 9/9: Removing bookkeeping arrays...");
        surface.point_data.remove(FUNCTION_VALUES_ARRAY);
        surface.point_data.remove(VALID_MASK_ARRAY);

        log::info!("=== Poly-plane slice complete ===");
        log::info!(
            "Surface: {} triangles, {} points",
            surface.num_cells(),
            surface.num_points()
        );

        Ok(surface)
    }
}

/// Scale by (1, 1, 0): same cells and point data, z set to zero
pub fn flatten(input: &PolyData) -> PolyData {
    let points = input.points.iter().map(|p| Point3D::new(p.x, p.y, 0.0)).collect();
    let mut output = PolyData::new(points, input.cells.clone());
    output.point_data = input.point_data.clone();
    output
}

/// Flattened copy of the first poly-line with its points in traversal order
pub fn flatten_polyline(line: &PolyData) -> PolyData {
    let Some(cell) = line.cells.iter().find(|c| c.kind.is_line()) else {
        return PolyData::default();
    };

    let points = line
        .cell_points(cell)
        .map(|p| Point3D::new(p.x, p.y, 0.0))
        .collect();
    let mut output = PolyData::new(points, vec![Cell::poly_line((0..cell.len()).collect())]);
    output.point_data = line.point_data.select(&cell.point_ids);
    output
}

/// Cumulative distance along consecutive points, starting at zero
pub fn arc_length(points: &[Point3D]) -> Vec<f64> {
    let mut total = 0.0;
    let mut values = Vec::with_capacity(points.len());
    for (n, p) in points.iter().enumerate() {
        if n > 0 {
            total += (p - points[n - 1]).norm();
        }
        values.push(total);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slab() -> Volume {
        // 2 x 1 x 1 block of unit hexes
        let mut points = Vec::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..3 {
                    points.push(Point3D::new(i as f64, j as f64, k as f64));
                }
            }
        }
        let id = |i: usize, j: usize, k: usize| i + 3 * j + 6 * k;
        let cells = (0..2)
            .map(|i| {
                [
                    id(i, 0, 0),
                    id(i + 1, 0, 0),
                    id(i + 1, 1, 0),
                    id(i, 1, 0),
                    id(i, 0, 1),
                    id(i + 1, 0, 1),
                    id(i + 1, 1, 1),
                    id(i, 1, 1),
                ]
            })
            .collect();
        let mut point_data = PointData::new();
        point_data.insert("height", points.iter().map(|p| p.z).collect());
        Volume {
            points: Arc::new(points),
            cells,
            point_data,
        }
    }

    fn line(points: Vec<Point3D>, cells: Vec<Cell>) -> PolyData {
        PolyData::new(points, cells)
    }

    #[test]
    fn test_arc_length() {
        let pts = [
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(3.0, 4.0, 0.0),
            Point3D::new(3.0, 5.0, 0.0),
        ];
        assert_eq!(arc_length(&pts), vec![0.0, 5.0, 6.0]);
        assert!(arc_length(&[]).is_empty());
    }

    #[test]
    fn test_flatten_polyline_follows_traversal() {
        let mut input = line(
            vec![
                Point3D::new(2.0, 0.0, 1.0),
                Point3D::new(0.0, 0.0, 2.0),
                Point3D::new(1.0, 0.0, 3.0),
            ],
            vec![Cell::poly_line(vec![1, 2, 0])],
        );
        input.point_data.insert("v", vec![20.0, 0.0, 10.0]);

        let flat = flatten_polyline(&input);
        assert_eq!(flat.points[0], Point3D::new(0.0, 0.0, 0.0));
        assert_eq!(flat.points[2], Point3D::new(2.0, 0.0, 0.0));
        assert_eq!(flat.point_data.get("v"), Some(&[0.0, 10.0, 20.0][..]));
    }

    #[test]
    fn test_slice_across_slab() {
        let raw = line(
            vec![
                Point3D::new(2.0, 0.5, 0.0),
                Point3D::new(0.0, 0.5, 10.0),
                Point3D::new(2.0, 0.5, 0.0),
            ],
            vec![Cell::line(0, 1)],
        );
        let surface = SliceDriver::default().slice(&slab(), &raw).unwrap();

        assert!(!surface.is_empty());
        assert!(!surface.point_data.contains(FUNCTION_VALUES_ARRAY));
        assert!(!surface.point_data.contains(VALID_MASK_ARRAY));

        let arc = surface.point_data.get(ARC_LENGTH_ARRAY).unwrap();
        let height = surface.point_data.get("height").unwrap();
        for (n, p) in surface.points.iter().enumerate() {
            assert_relative_eq!(p.y, 0.5, epsilon = 1e-9);
            assert!(p.x >= -1e-9 && p.x <= 2.0 + 1e-9);
            // Line runs from x = 2 back to x = 0
            assert_relative_eq!(arc[n], 2.0 - p.x, epsilon = 1e-9);
            assert_relative_eq!(height[n], p.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_missed_volume_is_empty() {
        let raw = line(
            vec![Point3D::new(10.0, 10.0, 0.0), Point3D::new(11.0, 10.0, 0.0)],
            vec![Cell::line(0, 1)],
        );
        let surface = SliceDriver::default().slice(&slab(), &raw).unwrap();
        assert!(surface.is_empty());
    }

    #[test]
    fn test_errors() {
        let driver = SliceDriver::default();
        let raw = line(
            vec![Point3D::new(0.0, 0.5, 0.0), Point3D::new(1.0, 0.5, 0.0)],
            vec![Cell::line(0, 1)],
        );

        assert_eq!(
            driver.slice(&Volume::default(), &raw).unwrap_err(),
            SliceError::EmptyVolume
        );
        assert!(matches!(
            driver.slice_with_tolerance(&slab(), &raw, -1.0),
            Err(SliceError::InvalidTolerance(_))
        ));
        assert!(matches!(
            driver.slice_with_tolerance(&slab(), &raw, f64::NAN),
            Err(SliceError::InvalidTolerance(_))
        ));
        assert_eq!(
            driver.slice(&slab(), &PolyData::default()).unwrap_err(),
            SliceError::Stitch(StitchError::EmptyInput)
        );

        let stray_triangle = line(
            vec![Point3D::new(0.0, 0.5, 0.0), Point3D::new(1.0, 0.5, 0.0)],
            vec![Cell::line(0, 1), Cell::triangle(0, 1, 99)],
        );
        assert!(matches!(
            driver.slice(&slab(), &stray_triangle),
            Err(SliceError::InvalidLine(_))
        ));

        let mut short_array = raw.clone();
        short_array.point_data.insert("label", vec![1.0]);
        assert!(matches!(
            driver.slice(&slab(), &short_array),
            Err(SliceError::InvalidLine(_))
        ));

        let vertical = line(
            vec![Point3D::new(1.0, 0.5, 0.0), Point3D::new(1.0, 0.5, 5.0)],
            vec![Cell::line(0, 1)],
        );
        assert_eq!(
            driver.slice(&slab(), &vertical).unwrap_err(),
            SliceError::DegenerateLine
        );
    }
}
