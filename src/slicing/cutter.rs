// Cut a hexahedral volume with an implicit function using marching tetrahedra.
//
// Each hexahedron is split into six tetrahedra around its 0-6 diagonal; on a
// structured lattice the face diagonals of neighbouring cells agree, so the
// resulting surface is crack-free. Per tet, vertices are classified as
// above (value >= 0) or below:
//   - 0 or 4 above: no intersection
//   - 1 or 3 above: one triangle (3 edge crossings)
//   - 2 above: one quad (4 edge crossings), split into two triangles
// Edge crossings are shared between tets through an edge-keyed map, and every
// volume point array is interpolated onto them.

use super::Volume;
use crate::geometry::{lerp, Point3D, Vector3D};
use crate::poly_data::{Cell, PointData, PointId, PolyData};
use rayon::prelude::*;
use std::collections::HashMap;

/// Name of the interpolated implicit-function array on the cut
pub const FUNCTION_VALUES_ARRAY: &str = "functionValues";

const HEX_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

/// Zero-level cut of `volume` under `function`
pub fn cut_volume<F>(volume: &Volume, function: F) -> PolyData
where
    F: Fn(&Point3D) -> f64 + Sync,
{
    let values: Vec<f64> = volume.points.par_iter().map(|p| function(p)).collect();

    let mut builder = CutBuilder::new(volume, &values);
    for hex in &volume.cells {
        for tet in HEX_TETS {
            builder.add_tet([hex[tet[0]], hex[tet[1]], hex[tet[2]], hex[tet[3]]]);
        }
    }

    let cut = builder.finish();
    log::debug!(
        "Cut {} cells: {} triangles, {} points",
        volume.cells.len(),
        cut.num_cells(),
        cut.num_points()
    );
    cut
}

struct CutBuilder<'a> {
    volume: &'a Volume,
    values: &'a [f64],
    edge_points: HashMap<(PointId, PointId), PointId>,
    points: Vec<Point3D>,
    /// (a, b, t) per output point, for attribute interpolation
    origins: Vec<(PointId, PointId, f64)>,
    cells: Vec<Cell>,
}

impl<'a> CutBuilder<'a> {
    fn new(volume: &'a Volume, values: &'a [f64]) -> Self {
        Self {
            volume,
            values,
            edge_points: HashMap::new(),
            points: Vec::new(),
            origins: Vec::new(),
            cells: Vec::new(),
        }
    }

    fn add_tet(&mut self, v: [PointId; 4]) {
        let above = v.map(|id| self.values[id] >= 0.0);
        let count_above = above.iter().filter(|&&a| a).count();

        let ups: Vec<PointId> = (0..4).filter(|&i| above[i]).map(|i| v[i]).collect();
        let downs: Vec<PointId> = (0..4).filter(|&i| !above[i]).map(|i| v[i]).collect();

        if count_above == 0 || count_above == 4 {
            return;
        }

        // Triangles face the side where the function is positive
        let centroid = |ids: &[PointId]| {
            ids.iter()
                .fold(Vector3D::zeros(), |acc, &id| acc + self.volume.points[id].coords)
                / ids.len() as f64
        };
        let uphill = centroid(&ups) - centroid(&downs);

        match count_above {
            1 => {
                let p: Vec<PointId> = downs.iter().map(|&d| self.crossing(ups[0], d)).collect();
                self.push_triangle(p[0], p[1], p[2], &uphill);
            }
            3 => {
                let p: Vec<PointId> = ups.iter().map(|&u| self.crossing(u, downs[0])).collect();
                self.push_triangle(p[0], p[1], p[2], &uphill);
            }
            2 => {
                // Cyclic order around the quad: a0b0, a0b1, a1b1, a1b0
                let q = [
                    self.crossing(ups[0], downs[0]),
                    self.crossing(ups[0], downs[1]),
                    self.crossing(ups[1], downs[1]),
                    self.crossing(ups[1], downs[0]),
                ];
                self.push_triangle(q[0], q[1], q[2], &uphill);
                self.push_triangle(q[0], q[2], q[3], &uphill);
            }
            _ => unreachable!(),
        }
    }

    /// Point where the function crosses zero between `up` (>= 0) and `down` (< 0)
    fn crossing(&mut self, up: PointId, down: PointId) -> PointId {
        let (fu, fd) = (self.values[up], self.values[down]);
        let t = fu / (fu - fd);

        // A crossing exactly at a vertex is shared by every edge leaving it
        let key = if t == 0.0 {
            (up, up)
        } else {
            (up.min(down), up.max(down))
        };

        if let Some(&id) = self.edge_points.get(&key) {
            return id;
        }

        let id = self.points.len();
        let (a, b, t) = if key.0 == up { (up, down, t) } else { (down, up, 1.0 - t) };
        self.points
            .push(lerp(&self.volume.points[a], &self.volume.points[b], t));
        self.origins.push((a, b, t));
        self.edge_points.insert(key, id);
        id
    }

    fn push_triangle(&mut self, a: PointId, b: PointId, c: PointId, uphill: &Vector3D) {
        if a == b || b == c || a == c {
            return;
        }
        let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
        let normal = (pb - pa).cross(&(pc - pa));
        if normal.dot(uphill) < 0.0 {
            self.cells.push(Cell::triangle(a, c, b));
        } else {
            self.cells.push(Cell::triangle(a, b, c));
        }
    }

    fn finish(self) -> PolyData {
        let interpolate = |values: &[f64]| -> Vec<f64> {
            self.origins
                .iter()
                .map(|&(a, b, t)| values[a] + t * (values[b] - values[a]))
                .collect()
        };

        let mut point_data = PointData::new();
        for array in self.volume.point_data.iter() {
            point_data.insert(array.name.clone(), interpolate(&array.values));
        }
        point_data.insert(FUNCTION_VALUES_ARRAY, interpolate(self.values));

        let mut cut = PolyData::new(self.points, self.cells);
        cut.point_data = point_data;
        cut
    }
}
