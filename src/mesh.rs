use crate::geometry::{Point3D, Triangle};
use crate::poly_data::{CellKind, PolyData};
use std::io::{Read, Seek, Write};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Failed to load mesh: {0}")]
    LoadError(String),

    #[error("Failed to write mesh: {0}")]
    WriteError(String),

    #[error("Empty mesh")]
    EmptyMesh,
}

/// Triangle soup with bounds, used for exporting sliced surfaces
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub bounds_min: Point3D,
    pub bounds_max: Point3D,
}

impl Mesh {
    /// Create a new mesh from triangles
    pub fn new(triangles: Vec<Triangle>) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        let (bounds_min, bounds_max) = Self::compute_bounds(&triangles);

        Ok(Self {
            triangles,
            bounds_min,
            bounds_max,
        })
    }

    /// Triangles and fan-triangulated polygons of `surface`; other cells are skipped
    pub fn from_poly_data(surface: &PolyData) -> Result<Self, MeshError> {
        let mut triangles = Vec::new();

        for cell in &surface.cells {
            if !matches!(cell.kind, CellKind::Triangle | CellKind::Polygon) || cell.len() < 3 {
                continue;
            }
            let ids = &cell.point_ids;
            for n in 1..ids.len() - 1 {
                triangles.push(Triangle::new(
                    surface.points[ids[0]],
                    surface.points[ids[n]],
                    surface.points[ids[n + 1]],
                ));
            }
        }

        Self::new(triangles)
    }

    pub fn read_stl_from<R: Read + Seek>(reader: &mut R) -> Result<Self, MeshError> {
        let stl = stl_io::read_stl(reader).map_err(|e| MeshError::LoadError(e.to_string()))?;

        let vertex = |idx: usize| {
            let v = &stl.vertices[idx];
            Point3D::new(v[0] as f64, v[1] as f64, v[2] as f64)
        };
        let triangles = stl
            .faces
            .iter()
            .map(|face| Triangle::new(vertex(face.vertices[0]), vertex(face.vertices[1]), vertex(face.vertices[2])))
            .collect();

        Self::new(triangles)
    }

    /// Load mesh from STL file
    pub fn from_stl<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let mut file = std::fs::File::open(path).map_err(|e| MeshError::LoadError(e.to_string()))?;
        Self::read_stl_from(&mut file)
    }

    /// Write as binary STL
    pub fn write_stl_to<W: Write>(&self, writer: &mut W) -> Result<(), MeshError> {
        let to_f32 = |p: &Point3D| [p.x as f32, p.y as f32, p.z as f32];

        let faces: Vec<stl_io::Triangle> = self
            .triangles
            .iter()
            .map(|tri| {
                let n = tri.normal();
                stl_io::Triangle {
                    normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [
                        stl_io::Vertex::new(to_f32(&tri.v0)),
                        stl_io::Vertex::new(to_f32(&tri.v1)),
                        stl_io::Vertex::new(to_f32(&tri.v2)),
                    ],
                }
            })
            .collect();

        stl_io::write_stl(writer, faces.iter()).map_err(|e| MeshError::WriteError(e.to_string()))
    }

    pub fn write_stl<P: AsRef<Path>>(&self, path: P) -> Result<(), MeshError> {
        let file = std::fs::File::create(path).map_err(|e| MeshError::WriteError(e.to_string()))?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_stl_to(&mut writer)?;
        writer.flush().map_err(|e| MeshError::WriteError(e.to_string()))
    }

    fn compute_bounds(triangles: &[Triangle]) -> (Point3D, Point3D) {
        let first = triangles[0].v0;
        triangles
            .iter()
            .flat_map(|tri| [tri.v0, tri.v1, tri.v2])
            .fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)))
    }

    /// Total surface area
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    /// Number of triangles in mesh
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly_data::Cell;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn unit_square() -> PolyData {
        PolyData::new(
            vec![
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(1.0, 0.0, 0.0),
                Point3D::new(1.0, 1.0, 1.0),
                Point3D::new(0.0, 1.0, 1.0),
            ],
            vec![Cell::new(CellKind::Polygon, vec![0, 1, 2, 3]), Cell::line(0, 2)],
        )
    }

    #[test]
    fn test_from_poly_data() {
        let mesh = Mesh::from_poly_data(&unit_square()).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.bounds_min, Point3D::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.bounds_max, Point3D::new(1.0, 1.0, 1.0));
        assert_relative_eq!(mesh.area(), 2.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_surface() {
        let line_only = PolyData::new(vec![Point3D::origin(); 2], vec![Cell::line(0, 1)]);
        assert!(matches!(Mesh::from_poly_data(&line_only), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_stl_output_reads_back() {
        let mesh = Mesh::from_poly_data(&unit_square()).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        mesh.write_stl_to(&mut buffer).unwrap();
        // 80-byte header, count, 50 bytes per face
        assert_eq!(buffer.get_ref().len(), 84 + 50 * 2);

        buffer.set_position(0);
        let read = Mesh::read_stl_from(&mut buffer).unwrap();
        assert_eq!(read.num_triangles(), 2);
        assert_eq!(read.bounds_max, mesh.bounds_max);
    }
}
