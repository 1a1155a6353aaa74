//! Solver configuration.
//!
//! Parameters that control time integration: timestep, XPBD substep
//! count, gravity and velocity damping.

use serde::{Deserialize, Serialize};
use tessel_types::{TesselError, TesselResult};

/// Configuration for the simulation solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Frame timestep (seconds).
    pub dt: f32,

    /// XPBD substeps per frame. Collision cadence is counted in substeps.
    pub substeps: u32,

    /// Gravity vector [gx, gy, gz] in m/s².
    pub gravity: [f32; 3],

    /// Velocity damping factor (0.0 = no damping, 1.0 = full damping).
    pub damping: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            dt: tessel_types::constants::DEFAULT_DT,
            substeps: 4,
            gravity: [0.0, -tessel_types::constants::GRAVITY, 0.0],
            damping: 0.01,
        }
    }
}

impl SolverConfig {
    /// Length of one substep (seconds).
    pub fn substep_dt(&self) -> f32 {
        self.dt / self.substeps.max(1) as f32
    }

    /// Rejects non-positive timesteps, zero substeps and out-of-range damping.
    pub fn validate(&self) -> TesselResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(TesselError::InvalidConfig(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.substeps == 0 {
            return Err(TesselError::InvalidConfig("substeps must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(TesselError::InvalidConfig(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        Ok(())
    }
}
