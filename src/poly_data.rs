// Point/cell data model shared by the stitcher and the slicer.
//
// Points live in an append-only collection behind an `Arc` so that filters
// which only rewrite connectivity (the stitcher) can hand back the same
// coordinates without copying them.

use crate::geometry::Point3D;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index into a point collection
pub type PointId = usize;

/// Primitive kinds that can appear in a `PolyData`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Vertex,
    Line,
    PolyLine,
    Triangle,
    Polygon,
}

impl CellKind {
    /// True for `Line` and `PolyLine`
    pub fn is_line(self) -> bool {
        matches!(self, CellKind::Line | CellKind::PolyLine)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellKind::Vertex => "vertex",
            CellKind::Line => "line",
            CellKind::PolyLine => "poly-line",
            CellKind::Triangle => "triangle",
            CellKind::Polygon => "polygon",
        };
        f.write_str(name)
    }
}

/// A primitive referencing an ordered sequence of point ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub point_ids: Vec<PointId>,
}

impl Cell {
    pub fn new(kind: CellKind, point_ids: Vec<PointId>) -> Self {
        Self { kind, point_ids }
    }

    pub fn line(a: PointId, b: PointId) -> Self {
        Self::new(CellKind::Line, vec![a, b])
    }

    pub fn poly_line(point_ids: Vec<PointId>) -> Self {
        Self::new(CellKind::PolyLine, point_ids)
    }

    pub fn triangle(a: PointId, b: PointId, c: PointId) -> Self {
        Self::new(CellKind::Triangle, vec![a, b, c])
    }

    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }

    pub fn first(&self) -> Option<PointId> {
        self.point_ids.first().copied()
    }

    pub fn last(&self) -> Option<PointId> {
        self.point_ids.last().copied()
    }
}

/// A named per-point scalar array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataArray {
    pub name: String,
    pub values: Vec<f64>,
}

/// Collection of named point arrays, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    arrays: Vec<DataArray>,
}

impl PointData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an array, replacing any existing array with the same name
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.arrays.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.values = values,
            None => self.arrays.push(DataArray { name, values }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.arrays
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.values.as_slice())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let pos = self.arrays.iter().position(|a| a.name == name)?;
        Some(self.arrays.remove(pos).values)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.iter().any(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|a| a.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Keep only the tuples at `ids`, in that order
    pub fn select(&self, ids: &[PointId]) -> PointData {
        PointData {
            arrays: self
                .arrays
                .iter()
                .map(|a| DataArray {
                    name: a.name.clone(),
                    values: ids.iter().map(|&id| a.values[id]).collect(),
                })
                .collect(),
        }
    }
}

/// Points, cells and per-point attributes
#[derive(Debug, Clone, Default)]
pub struct PolyData {
    pub points: Arc<Vec<Point3D>>,
    pub cells: Vec<Cell>,
    pub point_data: PointData,
}

impl PolyData {
    pub fn new(points: Vec<Point3D>, cells: Vec<Cell>) -> Self {
        Self {
            points: Arc::new(points),
            cells,
            point_data: PointData::new(),
        }
    }

    /// Build on an existing shared point collection
    pub fn with_shared_points(points: Arc<Vec<Point3D>>, cells: Vec<Cell>) -> Self {
        Self {
            points,
            cells,
            point_data: PointData::new(),
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Coordinates of a cell's points, in cell order
    pub fn cell_points<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Point3D> + 'a {
        cell.point_ids.iter().map(move |&id| &self.points[id])
    }

    /// Axis-aligned bounds, `None` when there are no points
    pub fn bounds(&self) -> Option<(Point3D, Point3D)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(min, max), p| {
            (
                Point3D::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Point3D::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }
}
