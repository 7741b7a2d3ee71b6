//! Fusion parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::FusionError;
use crate::pose::Pose2D;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the fusion engine, loaded from `fusion.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct FusionParams {
    /// Policy for pulling the pose toward incoming vision poses.
    pub mode: FusionMode,

    /// Vision poses reporting a confidence below this are rejected.
    pub min_confidence_threshold: f64,

    /// Largest linear correction applied per vision pose in gradual mode.
    ///
    /// Units: meters
    pub max_shift_per_tick_m: f64,

    /// Largest angular correction applied per vision pose in gradual mode.
    ///
    /// Units: radians
    pub max_shift_per_tick_rad: f64,

    /// Number of vision poses in the smoothing history, 0 disables smoothing.
    #[serde(default)]
    pub vision_filter_window: usize,

    /// Pose of the camera in the robot frame.
    #[serde(default)]
    pub camera_offset: Pose2D,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How aggressively the pose is pulled toward the vision estimate.
#[derive(Deserialize, serde::Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Snap straight onto each accepted vision pose.
    Instant,

    /// Move toward each accepted vision pose by at most the per tick shift.
    Gradual,

    /// Use the vision pose verbatim, wheel odometry only follows along through the tares.
    VisionOnly,

    /// Ignore vision entirely.
    WheelOdomOnly,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FusionMode {
    fn default() -> Self {
        FusionMode::WheelOdomOnly
    }
}

impl FusionParams {
    pub fn validate(&self) -> Result<(), FusionError> {
        let t = self.min_confidence_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(FusionError::InvalidParam("min_confidence_threshold", t));
        }

        if !(self.max_shift_per_tick_m.is_finite() && self.max_shift_per_tick_m > 0.0) {
            return Err(FusionError::InvalidParam(
                "max_shift_per_tick_m",
                self.max_shift_per_tick_m,
            ));
        }

        if !(self.max_shift_per_tick_rad.is_finite() && self.max_shift_per_tick_rad > 0.0) {
            return Err(FusionError::InvalidParam(
                "max_shift_per_tick_rad",
                self.max_shift_per_tick_rad,
            ));
        }

        let offset = &self.camera_offset;
        for &(name, value) in &[
            ("camera_offset.x", offset.x),
            ("camera_offset.y", offset.y),
            ("camera_offset.yaw", offset.yaw),
        ] {
            if !value.is_finite() {
                return Err(FusionError::InvalidParam(name, value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_mode() {
        let p: FusionParams = util::params::from_str(
            r#"
            mode = "vision_only"
            min_confidence_threshold = 0.5
            max_shift_per_tick_m = 0.01
            max_shift_per_tick_rad = 0.005
            "#,
        )
        .unwrap();

        assert_eq!(p.mode, FusionMode::VisionOnly);
        assert_eq!(p.vision_filter_window, 0);
        assert!(p.camera_offset.is_zero());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let good = FusionParams {
            mode: FusionMode::Gradual,
            min_confidence_threshold: 0.5,
            max_shift_per_tick_m: 0.01,
            max_shift_per_tick_rad: 0.01,
            ..Default::default()
        };
        assert!(good.validate().is_ok());

        let mut p = good.clone();
        p.min_confidence_threshold = 1.5;
        assert!(p.validate().is_err());

        let mut p = good.clone();
        p.max_shift_per_tick_m = 0.0;
        assert!(p.validate().is_err());

        let mut p = good.clone();
        p.max_shift_per_tick_rad = std::f64::INFINITY;
        assert!(p.validate().is_err());

        // The offending component of the camera offset is named
        let mut p = good;
        p.camera_offset.yaw = std::f64::INFINITY;
        match p.validate() {
            Err(FusionError::InvalidParam(name, value)) => {
                assert_eq!(name, "camera_offset.yaw");
                assert!(value.is_infinite());
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
