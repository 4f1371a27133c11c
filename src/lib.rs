// Core modules for polyline stitching, explicit hex grids and poly-plane slicing
pub mod geometry;
pub mod poly_data;
pub mod stitch;
pub mod explicit_grid;
pub mod slicing;
pub mod mesh;

// Re-export commonly used types
pub use geometry::{Point3D, Vector3D, LineSegment};
pub use poly_data::{Cell, CellKind, PointData, PointId, PolyData};
pub use stitch::{stitch, LinePiece, PolylineStitcher, StitchError};
pub use explicit_grid::{
    Extent, GeneratorConfig, GeneratorMode, GridError, HexCorners, HexGrid, HexGridSource,
    SourceOutput,
};
pub use slicing::{DefaultKernel, GeometryKernel, SliceConfig, SliceDriver, SliceError, Volume};
pub use mesh::{Mesh, MeshError};

/// Main result type for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Stitch error: {0}")]
    Stitch(#[from] StitchError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Slice error: {0}")]
    Slice(#[from] SliceError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
