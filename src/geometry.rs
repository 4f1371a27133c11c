use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// 3D point type
pub type Point3D = Point3<f64>;

/// 3D vector type
pub type Vector3D = Vector3<f64>;

/// Triangle defined by three vertices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub v0: Point3D,
    pub v1: Point3D,
    pub v2: Point3D,
}

impl Triangle {
    pub fn new(v0: Point3D, v1: Point3D, v2: Point3D) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unit normal, or (0, 0, 1) for degenerate triangles
    pub fn normal(&self) -> Vector3D {
        let cross = (self.v1 - self.v0).cross(&(self.v2 - self.v0));
        let norm = cross.norm();

        if norm < 1e-10 || !norm.is_finite() {
            return Vector3D::new(0.0, 0.0, 1.0);
        }

        cross / norm
    }

    pub fn area(&self) -> f64 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm() / 2.0
    }
}

/// Line segment in 3D space
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point3D,
    pub end: Point3D,
}

impl LineSegment {
    pub fn new(start: Point3D, end: Point3D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn direction(&self) -> Vector3D {
        (self.end - self.start).normalize()
    }

    /// Closest point to `p`: segment parameter in [0, 1] and distance
    pub fn closest_point(&self, p: &Point3D) -> (f64, f64) {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();

        let t = if len_sq < 1e-24 {
            0.0
        } else {
            ((p - self.start).dot(&d) / len_sq).clamp(0.0, 1.0)
        };

        (t, (p - lerp(&self.start, &self.end, t)).norm())
    }

    /// Closest point to `p` in the XY plane (z ignored).
    /// Returns the segment parameter in [0, 1] and the XY distance.
    pub fn closest_xy(&self, p: &Point3D) -> (f64, f64) {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;

        let t = if len_sq < 1e-24 {
            0.0
        } else {
            (((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len_sq).clamp(0.0, 1.0)
        };

        let cx = self.start.x + t * dx;
        let cy = self.start.y + t * dy;
        (t, ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
    }
}

/// Linear interpolation between two points
pub fn lerp(a: &Point3D, b: &Point3D, t: f64) -> Point3D {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_normal_and_area() {
        let tri = Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        );

        assert_relative_eq!(tri.normal().z, 1.0);
        assert_relative_eq!(tri.area(), 0.5);
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let p = Point3D::new(1.0, 1.0, 1.0);
        let tri = Triangle::new(p, p, p);
        assert_eq!(tri.normal(), Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_closest_xy_ignores_z() {
        let seg = LineSegment::new(Point3D::new(0.0, 0.0, 0.0), Point3D::new(10.0, 0.0, 0.0));

        let (t, d) = seg.closest_xy(&Point3D::new(2.5, 3.0, 100.0));
        assert_relative_eq!(t, 0.25);
        assert_relative_eq!(d, 3.0);

        // Beyond the end clamps to the endpoint
        let (t, d) = seg.closest_xy(&Point3D::new(13.0, 4.0, 0.0));
        assert_relative_eq!(t, 1.0);
        assert_relative_eq!(d, 5.0);
    }
}
