// src/config.rs
//! Physics configuration, loadable from JSON.
//!
//! ```json
//! {
//!   "gravity": [0.0, -9.81, 0.0],
//!   "simulation_distance": 150.0,
//!   "step_mode": { "mode": "fixed", "dt": 0.0166, "max_substeps": 4 },
//!   "space": { "velocity_policy": "all_colliders" }
//! }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SIMULATION_DISTANCE: f32 = 100.0;
pub const DEFAULT_EXTRACTION_EPSILON: f32 = 0.001;
pub const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
pub const DEFAULT_MAX_SUBSTEPS: u32 = 5;

/// How the supplied step time drives the native world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// One native step of exactly the supplied step time per simulate call.
    #[default]
    Variable,
    /// Accumulate the supplied step time and consume it in `dt` slices.
    Fixed { dt: f32, max_substeps: u32 },
}

impl StepMode {
    pub fn fixed(dt: f32) -> Self {
        StepMode::Fixed { dt, max_substeps: DEFAULT_MAX_SUBSTEPS }
    }
}

/// Which colliders a [`PhysicalSpace`](crate::PhysicalSpace) update moves by their velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityPolicy {
    /// Only colliders flagged as rigid bodies.
    #[default]
    RigidBodiesOnly,
    /// Every non-fixed collider drifts by its velocity.
    AllColliders,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub velocity_policy: VelocityPolicy,
    /// Nudge applied when two colliders share a position exactly.
    pub extraction_epsilon: f32,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            velocity_policy: VelocityPolicy::default(),
            extraction_epsilon: DEFAULT_EXTRACTION_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Half-extent of the simulation space around the anchor.
    pub simulation_distance: f32,
    pub step_mode: StepMode,
    pub space: SpaceConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            simulation_distance: DEFAULT_SIMULATION_DISTANCE,
            step_mode: StepMode::default(),
            space: SpaceConfig::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;
        Self::from_json_str(&text).map_err(|e| e.context(format!("parsing {}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.simulation_distance > 0.0) {
            return Err(Error::invalid_argument(format!(
                "simulation_distance must be positive, got {}",
                self.simulation_distance
            )));
        }
        if let StepMode::Fixed { dt, max_substeps } = self.step_mode {
            if !(dt > 0.0) || max_substeps == 0 {
                return Err(Error::invalid_argument(format!(
                    "fixed step needs dt > 0 and max_substeps > 0, got dt={dt} max_substeps={max_substeps}"
                )));
            }
        }
        if self.space.extraction_epsilon <= 0.0 {
            return Err(Error::invalid_argument("extraction_epsilon must be positive"));
        }
        Ok(())
    }
}
