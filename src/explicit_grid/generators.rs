// Hexahedral grid generators.
//
// All variants lay points on a unit lattice (scaled by `spacing`) and displace
// z with a sinusoidal fold across the whole extent's i-axis:
//
//     fold(i, offset) = 0.5 * nz * sin((i + offset) * PI / nx)
//
// where i is relative to the whole extent's iMin. A vertex column at relative
// position X always sees fold(X, 1); the per-cell variants reach the same value
// through fold(i, 1) on their left face and fold(i, 2) on their right face.
//
// Variants differ in how points are shared:
//   - Pillar: the top quad of cell k is the bottom quad of cell k+1
//   - Discontinuous: eight fresh points per cell
//   - Continuous / Pyramid: one point per lattice vertex
//   - Steps: one lattice per i-block, nothing shared across blocks

use super::{CellData, CellState, Extent, GeneratorConfig, GeneratorMode, GridError, HexCorners, HexGrid};
use crate::geometry::{Point3D, Vector3D};
use crate::poly_data::PointId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Build a grid over `sub` shaped by `whole`.
///
/// `pyramid_step` is the block width for `Steps` and the pyramid size for
/// `Pyramid`; other modes ignore it. `rank` is written to every cell.
pub fn generate(
    mode: GeneratorMode,
    whole: &Extent,
    sub: &Extent,
    pyramid_step: i32,
    config: &GeneratorConfig,
    rank: i32,
) -> Result<HexGrid, GridError> {
    validate_request(mode, whole, sub, pyramid_step)?;

    let ctx = Context::new(*whole, *sub, config, rank);
    let grid = match mode {
        GeneratorMode::Pillar => pillar(&ctx),
        GeneratorMode::Discontinuous => discontinuous(&ctx),
        GeneratorMode::Continuous => continuous(&ctx),
        GeneratorMode::Steps => steps(&ctx, pyramid_step),
        GeneratorMode::Pyramid => pyramid(&ctx, pyramid_step),
    };

    log::debug!(
        "Generated {} grid over {}: {} points, {} present / {} blanked cells",
        mode,
        sub,
        grid.num_points(),
        grid.num_present_cells(),
        grid.num_blanked_cells()
    );
    Ok(grid)
}

/// Precondition checks shared by `generate` and the caching source
pub fn validate_request(mode: GeneratorMode, whole: &Extent, sub: &Extent, pyramid_step: i32) -> Result<(), GridError> {
    whole.validate()?;
    sub.validate()?;
    if !whole.contains(sub) {
        return Err(GridError::InvalidExtent {
            extent: *sub,
            reason: format!("not contained in whole extent {whole}"),
        });
    }
    if mode.uses_step() && pyramid_step <= 0 {
        return Err(GridError::InvalidStepSize(pyramid_step));
    }
    Ok(())
}

struct Context<'a> {
    whole: Extent,
    sub: Extent,
    config: &'a GeneratorConfig,
    rank: i32,
    nx: i32,
    nz: i32,
}

impl<'a> Context<'a> {
    fn new(whole: Extent, sub: Extent, config: &'a GeneratorConfig, rank: i32) -> Self {
        Self {
            whole,
            sub,
            config,
            rank,
            nx: whole.i_max() - whole.i_min(),
            nz: whole.k_max() - whole.k_min(),
        }
    }

    fn fold(&self, i_rel: i32, offset: i32) -> f64 {
        0.5 * self.nz as f64 * ((i_rel + offset) as f64 * PI / self.nx as f64).sin()
    }

    /// Fold at a vertex column given in absolute logical coordinates
    fn vertex_fold(&self, ii: i32) -> f64 {
        self.fold(ii - self.whole.i_min(), 1)
    }

    fn x(&self, i: i32) -> f64 {
        i as f64 * self.config.spacing[0]
    }

    fn y(&self, j: i32) -> f64 {
        j as f64 * self.config.spacing[1]
    }

    fn z(&self, k: i32) -> f64 {
        k as f64 * self.config.spacing[2]
    }

    /// Layers that receive jitter; the first and the last two stay flat
    fn is_interior_layer(&self, k: i32) -> bool {
        k != self.whole.k_min() && k < self.whole.k_max() - 2
    }

    /// Horizontal quad of cell column (i, j) at height `z`
    fn quad(&self, i: i32, j: i32, z: f64, left: f64, right: f64) -> [Point3D; 4] {
        [
            Point3D::new(self.x(i), self.y(j), z + left),
            Point3D::new(self.x(i + 1), self.y(j), z + right),
            Point3D::new(self.x(i + 1), self.y(j + 1), z + right),
            Point3D::new(self.x(i), self.y(j + 1), z + left),
        ]
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.config.seed)
    }
}

/// Collects points, cell states and cell attributes for one grid
struct Assembler {
    extent: Extent,
    rank: i32,
    points: Vec<Point3D>,
    cells: Vec<CellState>,
    data: CellData,
}

impl Assembler {
    fn new(extent: Extent, rank: i32) -> Self {
        let n = extent.num_cells();
        Self {
            extent,
            rank,
            points: Vec::new(),
            cells: vec![CellState::Blanked; n],
            data: CellData::with_len(n),
        }
    }

    fn push_quad(&mut self, quad: [Point3D; 4]) -> [PointId; 4] {
        let base = self.points.len();
        self.points.extend_from_slice(&quad);
        [base, base + 1, base + 2, base + 3]
    }

    /// Insert one lattice of vertices covering cells [i0, i1) of the extent's
    /// j and k ranges. Ids follow `kk + jj*(nk) + ii*(nk*nj)` from `base`.
    fn push_lattice(&mut self, i0: i32, i1: i32, z_at: impl Fn(i32, i32) -> f64, xy: impl Fn(i32, i32) -> (f64, f64)) -> Lattice {
        let (j0, j1, k0, k1) = (
            self.extent.j_min(),
            self.extent.j_max(),
            self.extent.k_min(),
            self.extent.k_max(),
        );
        let lattice = Lattice {
            base: self.points.len(),
            i0,
            j0,
            k0,
            nj: (j1 - j0 + 1) as usize,
            nk: (k1 - k0 + 1) as usize,
        };

        for ii in i0..=i1 {
            for jj in j0..=j1 {
                let (x, y) = xy(ii, jj);
                for kk in k0..=k1 {
                    self.points.push(Point3D::new(x, y, z_at(ii, kk)));
                }
            }
        }
        lattice
    }

    /// Record cell (i, j, k). Rank and coordinates are always written, the
    /// distance only for present cells.
    fn insert(&mut self, [i, j, k]: [i32; 3], corners: Option<HexCorners>) {
        let Some(idx) = self.extent.cell_index(i, j, k) else {
            log::warn!("Skipping cell ({i}, {j}, {k}) outside {}", self.extent);
            return;
        };

        self.data.rank[idx] = self.rank;
        self.data.coordinates[idx] = [i, j, k];
        if let Some(corners) = corners {
            self.data.distance_to_origin[idx] = Vector3D::new(i as f64, j as f64, k as f64).norm();
            self.cells[idx] = CellState::Present(corners);
        }
    }

    fn finish(self) -> HexGrid {
        HexGrid::from_parts(self.extent, self.points, self.cells, self.data)
    }
}

/// Id arithmetic for a vertex lattice inserted by `Assembler::push_lattice`
struct Lattice {
    base: PointId,
    i0: i32,
    j0: i32,
    k0: i32,
    nj: usize,
    nk: usize,
}

impl Lattice {
    fn id(&self, ii: i32, jj: i32, kk: i32) -> PointId {
        let (di, dj, dk) = (
            (ii - self.i0) as usize,
            (jj - self.j0) as usize,
            (kk - self.k0) as usize,
        );
        self.base + dk + dj * self.nk + di * self.nk * self.nj
    }

    fn corners(&self, i: i32, j: i32, k: i32) -> HexCorners {
        let layer = |kk| {
            [
                self.id(i, j, kk),
                self.id(i + 1, j, kk),
                self.id(i + 1, j + 1, kk),
                self.id(i, j + 1, kk),
            ]
        };
        HexCorners::new(layer(k), layer(k + 1))
    }
}

fn pillar(ctx: &Context) -> HexGrid {
    let sub = ctx.sub;
    let half = ctx.nx / 2;
    let mut rng = ctx.rng();
    let mut out = Assembler::new(sub, ctx.rank);

    for i in sub.i_min()..sub.i_max() {
        let rel = i - ctx.whole.i_min();
        let fault = if rel > half { ctx.config.fault_shift } else { 0.0 };
        let left = ctx.fold(rel, 1) + fault;
        let right = ctx.fold(rel, 2) + fault;

        for j in sub.j_min()..sub.j_max() {
            let mut last_top: Option<[PointId; 4]> = None;

            for k in sub.k_min()..sub.k_max() {
                let bottom = match last_top {
                    Some(top) => top,
                    None => out.push_quad(ctx.quad(i, j, ctx.z(k), left, right)),
                };

                let jitter = if ctx.is_interior_layer(k) {
                    ctx.config.jitter * (2.0 * rng.gen::<f64>() - 1.0)
                } else {
                    0.0
                };
                let top = out.push_quad(ctx.quad(i, j, ctx.z(k + 1) + jitter, left, right));

                out.insert([i, j, k], Some(HexCorners::new(bottom, top)));
                last_top = Some(top);
            }
        }
    }

    let n = sub.num_cells();
    let mut grid = out.finish();
    grid.set_object_id(vec![0; n]);
    grid
}

fn discontinuous(ctx: &Context) -> HexGrid {
    let sub = ctx.sub;
    let half = ctx.nx / 2;
    let mut out = Assembler::new(sub, ctx.rank);

    for i in sub.i_min()..sub.i_max() {
        let rel = i - ctx.whole.i_min();
        let fault = if rel <= half { ctx.config.fault_shift } else { 0.0 };
        let left = ctx.fold(rel, 1) + fault;
        let right = ctx.fold(rel, 2) + fault;

        for j in sub.j_min()..sub.j_max() {
            for k in sub.k_min()..sub.k_max() {
                let bottom = out.push_quad(ctx.quad(i, j, ctx.z(k), left, right));
                let top = out.push_quad(ctx.quad(i, j, ctx.z(k + 1), left, right));
                out.insert([i, j, k], Some(HexCorners::new(bottom, top)));
            }
        }
    }

    out.finish()
}

fn continuous(ctx: &Context) -> HexGrid {
    let sub = ctx.sub;
    let mut out = Assembler::new(sub, ctx.rank);

    let lattice = out.push_lattice(
        sub.i_min(),
        sub.i_max(),
        |ii, kk| ctx.z(kk) + ctx.vertex_fold(ii),
        |ii, jj| (ctx.x(ii), ctx.y(jj)),
    );

    for i in sub.i_min()..sub.i_max() {
        for j in sub.j_min()..sub.j_max() {
            for k in sub.k_min()..sub.k_max() {
                out.insert([i, j, k], Some(lattice.corners(i, j, k)));
            }
        }
    }

    out.finish()
}

fn steps(ctx: &Context, lstep: i32) -> HexGrid {
    let sub = ctx.sub;
    let whole = ctx.whole;
    let nsteps = (ctx.nx / lstep).max(1);
    let mut out = Assembler::new(sub, ctx.rank);

    // One draw per block of the whole extent, so every piece sees the same shifts
    let mut rng = ctx.rng();
    let shifts: Vec<f64> = (0..nsteps)
        .map(|b| {
            let fault = if 2 * b >= nsteps && nsteps > 1 { ctx.config.fault_shift } else { 0.0 };
            ctx.config.step_shift * rng.gen::<f64>() + fault
        })
        .collect();

    for (b, &shift) in shifts.iter().enumerate() {
        let b = b as i32;
        let start = whole.i_min() + b * lstep;
        // Last block absorbs the remainder
        let end = if b == nsteps - 1 { whole.i_max() } else { start + lstep };

        let lo = start.max(sub.i_min());
        let hi = end.min(sub.i_max());
        if lo >= hi {
            continue;
        }

        let lattice = out.push_lattice(
            lo,
            hi,
            |ii, kk| ctx.z(kk) + ctx.vertex_fold(ii) + shift,
            |ii, jj| (ctx.x(ii), ctx.y(jj)),
        );

        for i in lo..hi {
            for j in sub.j_min()..sub.j_max() {
                for k in sub.k_min()..sub.k_max() {
                    out.insert([i, j, k], Some(lattice.corners(i, j, k)));
                }
            }
        }
    }

    out.finish()
}

/// Cell (i, j, k) of the pyramid is present when its relative (i + j) stays
/// below `size` times the number of layers left above it.
pub fn pyramid_contains(whole: &Extent, size: i32, i: i32, j: i32, k: i32) -> bool {
    (i - whole.i_min()) + (j - whole.j_min()) < size * (whole.k_max() - k)
}

fn pyramid(ctx: &Context, size: i32) -> HexGrid {
    let sub = ctx.sub;
    let mut out = Assembler::new(sub, ctx.rank);

    // Negated z: the apex points down
    let lattice = out.push_lattice(
        sub.i_min(),
        sub.i_max(),
        |ii, kk| -(ctx.z(kk) + ctx.vertex_fold(ii)),
        |ii, jj| (ctx.x(ii), ctx.y(jj)),
    );

    for i in sub.i_min()..sub.i_max() {
        for j in sub.j_min()..sub.j_max() {
            for k in sub.k_min()..sub.k_max() {
                let corners = pyramid_contains(&ctx.whole, size, i, j, k).then(|| lattice.corners(i, j, k));
                out.insert([i, j, k], corners);
            }
        }
    }

    out.finish()
}
