// Explicit structured grid generation
//
// 1. Validate the whole extent, the requested sub-extent and the step size
// 2. Build one of five hexahedral layouts over the sub-extent
// 3. Cache the structure keyed by the extent fingerprint
// 4. Overlay a time-dependent elevation field on every request

pub mod config;
pub mod extent;
pub mod generators;
pub mod hex;
pub mod source;

pub use config::{GeneratorConfig, GeneratorMode};
pub use extent::Extent;
pub use generators::{generate, pyramid_contains};
pub use hex::{CellData, CellState, Face, HexCorners, HexGrid};
pub use source::{extent_fingerprint, BuildRequest, GridBuilder, HexGridSource, SourceOutput, VariantBuilder};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("invalid extent {extent}: {reason}")]
    InvalidExtent { extent: Extent, reason: String },

    #[error("invalid step size {0}, must be positive")]
    InvalidStepSize(i32),
}
