use super::clean::clean_lines;
use super::cutter::cut_volume;
use super::poly_plane::PolyPlane;
use super::probe::probe_lines;
use super::threshold::threshold_valid;
use super::Volume;
use crate::poly_data::PolyData;

/// Geometric primitives used by the slice driver.
///
/// The driver only fixes the order in which these run; any implementation
/// honouring the contracts below can be swapped in.
pub trait GeometryKernel: Send + Sync {
    /// Merge points closer than `tolerance` and drop collapsed line cells
    fn clean(&self, line: &PolyData, tolerance: f64) -> PolyData;

    /// Vertical ruled surface through the first poly-line of `line`
    fn poly_plane(&self, line: &PolyData) -> Option<PolyPlane>;

    /// Zero-level cut of the volume against the surface, carrying an
    /// interpolated `functionValues` array plus every volume point array
    fn cut(&self, volume: &Volume, plane: &PolyPlane) -> PolyData;

    /// Target geometry with the source arrays resampled onto it and a
    /// `vtkValidPointMask` array
    fn probe(&self, source: &PolyData, target: &PolyData, tolerance: f64) -> PolyData;

    /// Surface cells whose points are all valid under `mask_name`
    fn threshold(&self, input: &PolyData, mask_name: &str) -> PolyData;
}

/// Built-in kernel for hexahedral volumes and vertical poly-planes
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKernel;

impl GeometryKernel for DefaultKernel {
    fn clean(&self, line: &PolyData, tolerance: f64) -> PolyData {
        clean_lines(line, tolerance)
    }

    fn poly_plane(&self, line: &PolyData) -> Option<PolyPlane> {
        PolyPlane::from_polyline(line)
    }

    fn cut(&self, volume: &Volume, plane: &PolyPlane) -> PolyData {
        cut_volume(volume, |p| plane.evaluate(p))
    }

    fn probe(&self, source: &PolyData, target: &PolyData, tolerance: f64) -> PolyData {
        probe_lines(source, target, tolerance)
    }

    fn threshold(&self, input: &PolyData, mask_name: &str) -> PolyData {
        threshold_valid(input, mask_name)
    }
}
