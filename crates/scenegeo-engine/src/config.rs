//! Engine tuning knobs.

use std::time::Duration;

use scenegeo_types::SceneError;
use serde::{Deserialize, Serialize};

/// How the engine decides where the device (and a provisional node) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    /// Trust the location sensor's latest fix only. Nodes placed at the
    /// current position are confirmed immediately.
    SensorOnly,
    /// Combine AR-tracked movement with the most accurate buffered fix.
    #[default]
    Fused,
}

/// Configuration for [`PositioningEngine`][crate::engine::PositioningEngine].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub estimate_method: EstimateMethod,
    /// Radius (metres / scene units) beyond which estimates are pruned,
    /// provisional nodes are confirmed and distant nodes are pulled in and
    /// scaled down.
    pub scene_limit: f64,
    /// Maximum number of live estimates.
    pub estimate_capacity: usize,
    /// A reliable heading within this many degrees of north resets the
    /// scene yaw.
    pub heading_reset_tolerance_deg: f64,
    /// Animation length of per-tick transform updates.
    pub animation_duration_ms: u64,
    /// On-screen size of an annotation per metre of effective distance.
    pub annotation_size_factor: f64,
    /// Beyond this geodetic distance annotations are shrunk further.
    pub far_annotation_distance: f64,
    pub far_annotation_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            estimate_method: EstimateMethod::Fused,
            scene_limit: 100.0,
            estimate_capacity: 30,
            heading_reset_tolerance_deg: 0.5,
            animation_duration_ms: 100,
            annotation_size_factor: 0.181,
            far_annotation_distance: 3000.0,
            far_annotation_factor: 0.75,
        }
    }
}

impl EngineConfig {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// Reject values the placement math cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.scene_limit.is_finite() && self.scene_limit > 0.0) {
            return Err(SceneError::Config(format!(
                "scene_limit must be positive, got {}",
                self.scene_limit
            )));
        }
        if self.estimate_capacity == 0 {
            return Err(SceneError::Config("estimate_capacity must be at least 1".into()));
        }
        if !(self.heading_reset_tolerance_deg >= 0.0 && self.heading_reset_tolerance_deg < 180.0) {
            return Err(SceneError::Config(format!(
                "heading_reset_tolerance_deg must be in [0, 180), got {}",
                self.heading_reset_tolerance_deg
            )));
        }
        for (name, value) in [
            ("annotation_size_factor", self.annotation_size_factor),
            ("far_annotation_distance", self.far_annotation_distance),
            ("far_annotation_factor", self.far_annotation_factor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SceneError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.scene_limit, 100.0);
        assert_eq!(cfg.estimate_capacity, 30);
        assert_eq!(cfg.animation_duration(), Duration::from_millis(100));
    }

    #[test]
    fn zero_scene_limit_is_rejected() {
        let cfg = EngineConfig {
            scene_limit: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SceneError::Config(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = EngineConfig {
            estimate_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"estimate_method":"sensor_only","scene_limit":50.0}"#).unwrap();
        assert_eq!(cfg.estimate_method, EstimateMethod::SensorOnly);
        assert_eq!(cfg.scene_limit, 50.0);
        assert_eq!(cfg.estimate_capacity, 30);
    }
}
