// Grid source with a single-slot structure cache and a time-varying overlay.
//
// The hexahedral structure only depends on the generator settings and the two
// extents, so it is cached under the extent fingerprint and shared through an
// `Arc`. The elevation overlay depends on the requested time and is rebuilt on
// every request.

use super::{generate, Extent, GeneratorConfig, GeneratorMode, GridError, HexGrid};
use crate::poly_data::PointData;
use crate::slicing::Volume;
use std::sync::{Arc, Mutex, PoisonError};

/// Name of the point array written by the source
pub const ELEVATION_ARRAY: &str = "Elevation";

/// Everything a builder needs to produce one grid
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub mode: GeneratorMode,
    pub whole: Extent,
    pub sub: Extent,
    pub pyramid_step: i32,
    pub rank: i32,
    pub config: &'a GeneratorConfig,
}

/// Produces the structural grid for a request
pub trait GridBuilder: Send + Sync {
    fn build(&self, request: &BuildRequest<'_>) -> Result<HexGrid, GridError>;
}

/// Builder dispatching to the five layout generators
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantBuilder;

impl GridBuilder for VariantBuilder {
    fn build(&self, request: &BuildRequest<'_>) -> Result<HexGrid, GridError> {
        generate(
            request.mode,
            &request.whole,
            &request.sub,
            request.pyramid_step,
            request.config,
            request.rank,
        )
    }
}

/// Cache key: the six sub-extent values then the six whole-extent values
pub fn extent_fingerprint(sub: &Extent, whole: &Extent) -> String {
    sub.0
        .iter()
        .chain(whole.0.iter())
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

struct CacheEntry {
    stamp: String,
    grid: Arc<HexGrid>,
}

/// Result of one source request
#[derive(Debug, Clone)]
pub struct SourceOutput {
    pub grid: Arc<HexGrid>,
    pub time: f64,
    /// Elevation ramp scaled by cos(time / 10), one value per grid point
    pub elevation: Vec<f64>,
    pub cache_hit: bool,
}

impl SourceOutput {
    pub fn point_data(&self) -> PointData {
        let mut pd = PointData::new();
        pd.insert(ELEVATION_ARRAY, self.elevation.clone());
        pd
    }

    /// Present cells with the elevation overlay, ready for slicing
    pub fn to_volume(&self) -> Volume {
        self.grid.to_volume(self.point_data())
    }
}

pub struct HexGridSource {
    config: GeneratorConfig,
    mode: GeneratorMode,
    pyramid_step: i32,
    whole_extent: Extent,
    builder: Box<dyn GridBuilder>,
    cache: Mutex<Option<CacheEntry>>,
}

impl HexGridSource {
    pub fn new(whole_extent: Extent, mode: GeneratorMode) -> Self {
        Self {
            config: GeneratorConfig::default(),
            mode,
            pyramid_step: 1,
            whole_extent,
            builder: Box::new(VariantBuilder),
            cache: Mutex::new(None),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.set_config(config);
        self
    }

    pub fn with_pyramid_step(mut self, step: i32) -> Self {
        self.set_pyramid_step(step);
        self
    }

    pub fn with_builder(mut self, builder: impl GridBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self.invalidate();
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn mode(&self) -> GeneratorMode {
        self.mode
    }

    pub fn pyramid_step(&self) -> i32 {
        self.pyramid_step
    }

    pub fn whole_extent(&self) -> Extent {
        self.whole_extent
    }

    pub fn set_config(&mut self, config: GeneratorConfig) {
        if self.config != config {
            self.config = config;
            self.invalidate();
        }
    }

    pub fn set_mode(&mut self, mode: GeneratorMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn set_pyramid_step(&mut self, step: i32) {
        if self.pyramid_step != step {
            self.pyramid_step = step;
            self.invalidate();
        }
    }

    pub fn set_whole_extent(&mut self, extent: Extent) {
        if self.whole_extent != extent {
            self.whole_extent = extent;
            self.invalidate();
        }
    }

    /// Drop the cached structure
    pub fn invalidate(&mut self) {
        *self.cache.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a request for `sub` would be served from the cache
    pub fn is_cached(&self, sub: &Extent) -> bool {
        let stamp = extent_fingerprint(sub, &self.whole_extent);
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_some_and(|entry| entry.stamp == stamp)
    }

    /// Time values advertised to consumers
    pub fn time_steps(&self) -> Vec<f64> {
        (0..self.config.number_of_time_steps).map(|t| t as f64).collect()
    }

    pub fn request_whole(&self, time: f64) -> Result<SourceOutput, GridError> {
        self.request(self.whole_extent, 0, time)
    }

    /// Request piece `piece` of `num_pieces`; `None` when that piece is empty
    pub fn request_piece(&self, piece: usize, num_pieces: usize, time: f64) -> Result<Option<SourceOutput>, GridError> {
        self.whole_extent.validate()?;
        match self.whole_extent.split(piece, num_pieces) {
            Some(sub) => self.request(sub, piece as i32, time).map(Some),
            None => Ok(None),
        }
    }

    /// Build (or fetch) the grid over `sub`, then apply the elevation overlay
    /// for `time`. `rank` labels the cells of a freshly built grid.
    pub fn request(&self, sub: Extent, rank: i32, time: f64) -> Result<SourceOutput, GridError> {
        super::generators::validate_request(self.mode, &self.whole_extent, &sub, self.pyramid_step)?;

        let stamp = extent_fingerprint(&sub, &self.whole_extent);
        let (grid, cache_hit) = {
            let mut slot = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(entry) if entry.stamp == stamp => (Arc::clone(&entry.grid), true),
                _ => {
                    *slot = None;
                    let request = BuildRequest {
                        mode: self.mode,
                        whole: self.whole_extent,
                        sub,
                        pyramid_step: self.pyramid_step,
                        rank,
                        config: &self.config,
                    };
                    let grid = Arc::new(self.builder.build(&request)?);
                    *slot = Some(CacheEntry {
                        stamp,
                        grid: Arc::clone(&grid),
                    });
                    (grid, false)
                }
            }
        };

        log::debug!(
            "Grid request {} at t={}: {}",
            sub,
            time,
            if cache_hit { "cache hit" } else { "rebuilt" }
        );

        let elevation = elevation(&grid, self.config.scalar_range, time);
        Ok(SourceOutput {
            grid,
            time,
            elevation,
            cache_hit,
        })
    }
}

/// Linear ramp from the low to the high bounds corner onto `range`, scaled by
/// cos(time / 10)
pub fn elevation(grid: &HexGrid, range: [f64; 2], time: f64) -> Vec<f64> {
    let Some((low, high)) = grid.bounds() else {
        return Vec::new();
    };
    let axis = high - low;
    let len_sq = axis.norm_squared();
    let scale = (time / 10.0).cos();

    grid.points()
        .iter()
        .map(|p| {
            let t = if len_sq > 0.0 {
                ((p - low).dot(&axis) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (range[0] + t * (range[1] - range[0])) * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(n: i32) -> Extent {
        Extent::new(0, n, 0, n, 0, n)
    }

    #[test]
    fn test_fingerprint_format() {
        let sub = Extent::new(0, 2, 0, 3, -1, 4);
        let whole = Extent::new(0, 10, 0, 10, -1, 10);
        assert_eq!(extent_fingerprint(&sub, &whole), "0,2,0,3,-1,4,0,10,0,10,-1,10");
    }

    #[test]
    fn test_hit_shares_structure() {
        let source = HexGridSource::new(cube(3), GeneratorMode::Continuous);
        let first = source.request_whole(0.0).unwrap();
        let second = source.request_whole(5.0).unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert!(Arc::ptr_eq(&first.grid, &second.grid));
        assert!(source.is_cached(&cube(3)));
    }

    #[test]
    fn test_setters_invalidate() {
        let mut source = HexGridSource::new(cube(2), GeneratorMode::Continuous);
        source.request_whole(0.0).unwrap();

        source.set_mode(GeneratorMode::Continuous);
        assert!(source.is_cached(&cube(2)));

        source.set_mode(GeneratorMode::Discontinuous);
        assert!(!source.is_cached(&cube(2)));
        assert_eq!(source.request_whole(0.0).unwrap().grid.num_points(), 64);
    }

    #[test]
    fn test_failed_request_keeps_cache() {
        let source = HexGridSource::new(cube(2), GeneratorMode::Continuous);
        source.request_whole(0.0).unwrap();

        let err = source.request(Extent::new(0, 5, 0, 2, 0, 2), 0, 0.0).unwrap_err();
        assert!(matches!(err, GridError::InvalidExtent { .. }));
        assert!(source.is_cached(&cube(2)));
    }

    #[test]
    fn test_elevation_follows_time() {
        let source = HexGridSource::new(cube(2), GeneratorMode::Continuous);
        let at_zero = source.request_whole(0.0).unwrap();
        let later = source.request_whole(10.0).unwrap();

        let (lo, hi) = at_zero
            .elevation
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert!(lo >= 0.0 && hi <= 1.0);

        for (a, b) in at_zero.elevation.iter().zip(&later.elevation) {
            assert_relative_eq!(*b, a * 1.0f64.cos(), epsilon = 1e-12);
        }
        assert_eq!(at_zero.point_data().get(ELEVATION_ARRAY).map(|v| v.len()), Some(27));
    }

    #[test]
    fn test_pieces_carry_rank() {
        let source = HexGridSource::new(Extent::new(0, 4, 0, 2, 0, 2), GeneratorMode::Continuous);
        let out = source.request_piece(1, 2, 0.0).unwrap().unwrap();

        assert_eq!(out.grid.extent(), Extent::new(2, 4, 0, 2, 0, 2));
        assert!(out.grid.cell_data().rank.iter().all(|&r| r == 1));
        assert!(source.request_piece(2, 2, 0.0).unwrap().is_none());
    }

    #[test]
    fn test_time_steps() {
        let config = GeneratorConfig {
            number_of_time_steps: 3,
            ..Default::default()
        };
        let source = HexGridSource::new(cube(1), GeneratorMode::Pillar).with_config(config);
        assert_eq!(source.time_steps(), vec![0.0, 1.0, 2.0]);
    }
}
