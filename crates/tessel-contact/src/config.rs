//! Collision-detection configuration.

use serde::{Deserialize, Serialize};
use tessel_types::constants::{DEFAULT_COLLISION_MINIMAL_DIST, DEFAULT_MAX_COLLISION_PAIRS};
use tessel_types::{TesselError, TesselResult};

/// Tunables of a detection session.
///
/// Fixed for the lifetime of a [`crate::CollisionDetector`]; capacities
/// are sized from it once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Narrow-phase contact threshold (meters).
    pub collision_minimal_dist: f32,

    /// Run detection every `detection_interval` solver substeps.
    pub detection_interval: u32,

    /// Broad-phase AABB inflation, as a multiple of `collision_minimal_dist`.
    pub margin_multiplier: f32,

    /// Capacity of both the candidate and the exact pair buffer.
    pub max_collision_pairs: u32,

    /// XPBD compliance of the vertex–triangle distance constraint
    /// (0.0 = rigid).
    pub xpbd_compliance: f32,

    /// Size of the caller-provided radix-sort scratch, in `u32` slots.
    /// `None` sizes it exactly from the capacity probe.
    pub sort_scratch_slots: Option<usize>,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collision_minimal_dist: DEFAULT_COLLISION_MINIMAL_DIST,
            detection_interval: 1,
            margin_multiplier: 1.0,
            max_collision_pairs: DEFAULT_MAX_COLLISION_PAIRS,
            xpbd_compliance: 0.0,
            sort_scratch_slots: None,
        }
    }
}

impl CollisionConfig {
    /// Safety margin added to every leaf AABB of the hierarchy.
    pub fn extended_dist(&self) -> f32 {
        self.margin_multiplier * self.collision_minimal_dist
    }

    /// Validates every field.
    pub fn validate(&self) -> TesselResult<()> {
        non_negative("collision_minimal_dist", self.collision_minimal_dist)?;
        non_negative("margin_multiplier", self.margin_multiplier)?;
        non_negative("xpbd_compliance", self.xpbd_compliance)?;
        if self.detection_interval == 0 {
            return Err(TesselError::InvalidConfig(
                "detection_interval must be at least 1".into(),
            ));
        }
        if self.max_collision_pairs == 0 {
            return Err(TesselError::InvalidConfig(
                "max_collision_pairs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> TesselResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TesselError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> TesselResult<String> {
        toml::to_string(self).map_err(|e| TesselError::Serialization(e.to_string()))
    }
}

fn non_negative(name: &str, value: f32) -> TesselResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TesselError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}
