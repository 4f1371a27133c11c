use serde::{Deserialize, Serialize};
use std::fmt;

/// Topological layout of the generated grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeneratorMode {
    /// Vertical pillars: each cell reuses the top face of the cell below
    Pillar,
    /// Eight fresh points per cell, no sharing at all
    Discontinuous,
    /// One point per logical vertex
    #[default]
    Continuous,
    /// Continuous slabs along i, each shifted independently
    Steps,
    /// Continuous indexing with a stepped pyramid of present cells
    Pyramid,
}

impl GeneratorMode {
    pub const ALL: [GeneratorMode; 5] = [
        GeneratorMode::Pillar,
        GeneratorMode::Discontinuous,
        GeneratorMode::Continuous,
        GeneratorMode::Steps,
        GeneratorMode::Pyramid,
    ];

    /// Modes that consume the step size
    pub fn uses_step(self) -> bool {
        matches!(self, GeneratorMode::Steps | GeneratorMode::Pyramid)
    }
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneratorMode::Pillar => "pillar",
            GeneratorMode::Discontinuous => "discontinuous",
            GeneratorMode::Continuous => "continuous",
            GeneratorMode::Steps => "steps",
            GeneratorMode::Pyramid => "pyramid",
        };
        f.write_str(name)
    }
}

/// Shape parameters shared by all generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Point spacing along x, y, z for one logical step
    pub spacing: [f64; 3],

    /// Constant z offset of the faulted half of the domain
    pub fault_shift: f64,

    /// Maximum magnitude of the per-layer z jitter (pillar)
    pub jitter: f64,

    /// Maximum magnitude of the per-block z shift (steps)
    pub step_shift: f64,

    /// Seed for the jitter generator
    pub seed: u64,

    /// Output range of the elevation ramp
    pub scalar_range: [f64; 2],

    /// Time values advertised by the source, 0..n
    pub number_of_time_steps: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spacing: [1.0, 1.0, 1.0],
            fault_shift: 2.0,
            jitter: 0.25,
            step_shift: 1.5,
            seed: 1,
            scalar_range: [0.0, 1.0],
            number_of_time_steps: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{ "fault_shift": 5.0 }"#).unwrap();
        assert_eq!(config.fault_shift, 5.0);
        assert_eq!(config.seed, 1);
        assert_eq!(config.spacing, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_mode_round_trip_name() {
        let json = serde_json::to_string(&GeneratorMode::Pyramid).unwrap();
        assert_eq!(json, "\"Pyramid\"");
        assert!(GeneratorMode::Steps.uses_step());
        assert!(!GeneratorMode::Pillar.uses_step());
    }
}
