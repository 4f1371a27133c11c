// Poly-plane: the ruled surface swept by a polyline along the z axis.
//
// Every ruling line is vertical, so the surface is fully described by the
// polyline's XY trace. The implicit value at a point is its XY distance to the
// nearest segment, signed by the side of that segment it falls on
// (normal = direction x Z). Beyond the polyline ends the zero set continues
// along the end segments.

use crate::geometry::{LineSegment, Point3D, Vector3D};
use crate::poly_data::{Cell, CellKind, PolyData};

#[derive(Debug, Clone)]
pub struct PolyPlane {
    segments: Vec<LineSegment>,
}

impl PolyPlane {
    /// Build from the first poly-line or line cell of `line`.
    /// Returns `None` if it has no segment of non-zero XY length.
    pub fn from_polyline(line: &PolyData) -> Option<Self> {
        let cell = line.cells.iter().find(|c| c.kind.is_line())?;
        let trace: Vec<Point3D> = line.cell_points(cell).copied().collect();
        Self::from_points(&trace)
    }

    pub fn from_points(trace: &[Point3D]) -> Option<Self> {
        let segments: Vec<LineSegment> = trace
            .windows(2)
            .map(|w| {
                LineSegment::new(
                    Point3D::new(w[0].x, w[0].y, 0.0),
                    Point3D::new(w[1].x, w[1].y, 0.0),
                )
            })
            .filter(|s| s.length() > 1e-12)
            .collect();

        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    /// Signed XY distance to the trace
    pub fn evaluate(&self, p: &Point3D) -> f64 {
        let mut best = (f64::INFINITY, 0.0);

        for seg in &self.segments {
            let (t, dist) = seg.closest_xy(p);
            if dist < best.0 {
                let dir = seg.direction();
                let normal = Vector3D::new(dir.y, -dir.x, 0.0);
                let c = seg.start + (seg.end - seg.start) * t;
                let side = normal.x * (p.x - c.x) + normal.y * (p.y - c.y);
                best = (dist, if side < 0.0 { -dist } else { dist });
            }
        }

        best.1
    }

    /// Vertical ruling lines at every trace vertex, from `z_min` to `z_max`
    pub fn ruling_lines(&self, z_min: f64, z_max: f64) -> Vec<(Point3D, Point3D)> {
        let first = self.segments[0].start;
        std::iter::once(first)
            .chain(self.segments.iter().map(|s| s.end))
            .map(|p| (Point3D::new(p.x, p.y, z_min), Point3D::new(p.x, p.y, z_max)))
            .collect()
    }

    /// Triangulated surface between consecutive ruling lines
    pub fn to_surface(&self, z_min: f64, z_max: f64) -> PolyData {
        let rulings = self.ruling_lines(z_min, z_max);
        let points: Vec<Point3D> = rulings.iter().flat_map(|&(bot, top)| [bot, top]).collect();

        let cells = (0..rulings.len() - 1)
            .flat_map(|n| {
                let (b0, t0, b1, t1) = (2 * n, 2 * n + 1, 2 * n + 2, 2 * n + 3);
                [Cell::new(CellKind::Triangle, vec![b0, b1, t1]), Cell::new(CellKind::Triangle, vec![b0, t1, t0])]
            })
            .collect();

        PolyData::new(points, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> PolyPlane {
        PolyPlane::from_points(&[
            Point3D::new(0.0, 0.0, 3.0),
            Point3D::new(4.0, 0.0, 3.0),
            Point3D::new(4.0, 4.0, 3.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_signed_distance() {
        let plane = l_shape();

        // Right of the first segment (heading +x) is -y
        assert_relative_eq!(plane.evaluate(&Point3D::new(2.0, -1.0, 0.0)), 1.0);
        assert_relative_eq!(plane.evaluate(&Point3D::new(2.0, 1.0, 50.0)), -1.0);
        assert_relative_eq!(plane.evaluate(&Point3D::new(2.0, 0.0, -7.0)), 0.0);

        // Second segment heads +y, so +x is the positive side
        assert_relative_eq!(plane.evaluate(&Point3D::new(5.0, 2.0, 0.0)), 1.0);
    }

    #[test]
    fn test_degenerate_trace() {
        let vertical = [Point3D::new(1.0, 1.0, 0.0), Point3D::new(1.0, 1.0, 9.0)];
        assert!(PolyPlane::from_points(&vertical).is_none());
        assert!(PolyPlane::from_polyline(&PolyData::default()).is_none());
    }

    #[test]
    fn test_surface() {
        let plane = l_shape();
        let rulings = plane.ruling_lines(-1.0, 2.0);
        assert_eq!(rulings.len(), 3);
        assert_eq!(rulings[2].1, Point3D::new(4.0, 4.0, 2.0));

        let surface = plane.to_surface(-1.0, 2.0);
        assert_eq!(surface.num_points(), 6);
        assert_eq!(surface.num_cells(), 4);
    }
}
