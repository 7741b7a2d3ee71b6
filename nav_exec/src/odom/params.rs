//! Odometry parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::{check_finite, check_positive, OdomError};
use crate::pose::Pose2D;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the odometry stack, loaded from `odom.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct OdomParams {
    /// Period of the control tick, used to difference the pose into a velocity.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// The forward tracking wheel.
    pub forward_tracker: TrackerParams,

    /// The sideways tracking wheel.
    pub sideways_tracker: TrackerParams,

    /// Pose of the tracking centre relative to the robot's geometric centre, negated.
    pub offset: Pose2D,
}

/// Geometry of a single tracking wheel.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct TrackerParams {
    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Wheel revolutions per encoder revolution.
    pub gear_ratio: f64,

    /// Signed distance from the tracking centre, such that a pure counter-clockwise rotation of
    /// `d_theta` radians advances the tracker by `center_offset_m * d_theta`.
    ///
    /// Units: meters
    pub center_offset_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdomParams {
    /// Check the parameters describe a physically meaningful configuration.
    pub fn validate(&self) -> Result<(), OdomError> {
        check_positive("odometry step period", self.step_period_s)?;
        self.forward_tracker.validate()?;
        self.sideways_tracker.validate()?;
        check_finite("odometry offset x", self.offset.x)?;
        check_finite("odometry offset y", self.offset.y)?;
        check_finite("odometry offset yaw", self.offset.yaw)?;

        Ok(())
    }
}

impl TrackerParams {
    pub fn validate(&self) -> Result<(), OdomError> {
        check_positive("tracker wheel diameter", self.wheel_diameter_m)?;
        check_positive("tracker gear ratio", self.gear_ratio)?;
        check_finite("tracker centre offset", self.center_offset_m)?;

        Ok(())
    }

    /// Linear travel of the wheel rim for the given encoder rotation.
    pub fn rotation_to_distance(&self, encoder_rad: f64) -> f64 {
        encoder_rad * self.gear_ratio * 0.5 * self.wheel_diameter_m
    }

    /// Encoder rotation producing the given linear travel of the wheel rim.
    pub fn distance_to_rotation(&self, distance_m: f64) -> f64 {
        util::maths::safe_div(
            distance_m,
            self.gear_ratio * 0.5 * self.wheel_diameter_m,
            0.0,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn tracker() -> TrackerParams {
        TrackerParams {
            wheel_diameter_m: 0.07,
            gear_ratio: 0.5,
            center_offset_m: 0.1,
        }
    }

    #[test]
    fn test_rotation_to_distance() {
        let t = tracker();

        // One encoder revolution is half a wheel revolution
        assert!((t.rotation_to_distance(2.0 * PI) - 0.5 * PI * 0.07).abs() < 1e-12);
        assert!((t.distance_to_rotation(t.rotation_to_distance(1.3)) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(tracker().validate().is_ok());

        let mut t = tracker();
        t.wheel_diameter_m = 0.0;
        assert_eq!(
            t.validate(),
            Err(OdomError::NotPositive("tracker wheel diameter", 0.0))
        );

        let mut t = tracker();
        t.gear_ratio = -1.0;
        assert!(t.validate().is_err());

        let mut t = tracker();
        t.center_offset_m = std::f64::NAN;
        assert!(t.validate().is_err());

        let params = OdomParams {
            step_period_s: 0.0,
            forward_tracker: tracker(),
            sideways_tracker: tracker(),
            offset: Pose2D::zero(),
        };
        assert!(params.validate().is_err());
    }
}
