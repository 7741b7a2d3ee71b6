//! # Drive mix
//!
//! Splits the conductor's drive and turn voltages between the left and right motor groups.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Deserialize;

// Internal
use super::ConductorError;
use comms_if::eqpt::drive::DriveDems;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive mix parameters
#[derive(Deserialize, Debug, Clone)]
pub struct DriveParams {
    /// The turn voltage is divided by this before being added to one side and taken from the
    /// other.
    pub turn_split_divisor: f64,

    /// Saturation applied to each side.
    ///
    /// Units: volts
    pub max_voltage_v: f64,
}

/// Mixes drive and turn into side demands.
#[derive(Debug, Clone)]
pub struct DriveMix {
    params: DriveParams,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can drive the motors.
pub trait DriveActuator {
    fn send_dems(&mut self, dems: &DriveDems);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            turn_split_divisor: 1.5,
            max_voltage_v: 12.0,
        }
    }
}

impl DriveMix {
    pub fn new(params: DriveParams) -> Result<Self, ConductorError> {
        if !(params.turn_split_divisor.is_finite() && params.turn_split_divisor > 0.0) {
            return Err(ConductorError::InvalidParam(
                "turn_split_divisor",
                params.turn_split_divisor,
            ));
        }
        if !(params.max_voltage_v.is_finite() && params.max_voltage_v > 0.0) {
            return Err(ConductorError::InvalidParam("max_voltage_v", params.max_voltage_v));
        }

        Ok(Self { params })
    }

    /// Positive turn rotates the robot counter-clockwise, so speeds up the right side.
    pub fn mix(&self, drive_v: f64, turn_v: f64) -> DriveDems {
        let max = self.params.max_voltage_v;
        let split = turn_v / self.params.turn_split_divisor;

        let dems = DriveDems {
            left_v: (drive_v - split).max(-max).min(max),
            right_v: (drive_v + split).max(-max).min(max),
        };

        trace!("Drive mix ({:.3}, {:.3}) -> {:?}", drive_v, turn_v, dems);

        dems
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mix() {
        let mix = DriveMix::new(DriveParams::default()).unwrap();

        let d = mix.mix(6.0, 3.0);
        assert_eq!(d.left_v, 4.0);
        assert_eq!(d.right_v, 8.0);

        let d = mix.mix(0.0, -1.5);
        assert_eq!(d.left_v, 1.0);
        assert_eq!(d.right_v, -1.0);

        assert!(mix.mix(0.0, 0.0).is_stop());
    }

    #[test]
    fn test_saturation() {
        let mix = DriveMix::new(DriveParams::default()).unwrap();

        let d = mix.mix(12.0, 6.0);
        assert_eq!(d.left_v, 8.0);
        assert_eq!(d.right_v, 12.0);

        let d = mix.mix(-20.0, 0.0);
        assert_eq!(d.left_v, -12.0);
        assert_eq!(d.right_v, -12.0);
    }

    #[test]
    fn test_invalid() {
        assert!(DriveMix::new(DriveParams {
            turn_split_divisor: 0.0,
            max_voltage_v: 12.0
        })
        .is_err());
        assert!(DriveMix::new(DriveParams {
            turn_split_divisor: 1.5,
            max_voltage_v: std::f64::NAN
        })
        .is_err());
    }
}
