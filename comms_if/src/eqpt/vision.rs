//! # Vision Pose Payload
//!
//! The vision co-processor reports its pose estimate as a whitespace separated ASCII record of
//! six or seven floats:
//!
//! ```text
//! x y z pitch yaw roll [confidence]
//! ```
//!
//! The record is expressed in the camera's native axes (x right, y up, z backward). Before use the
//! navigation core needs it in robot axes (x right, y forward, z up, yaw CCW positive), which is
//! what [`VisionPose::to_robot_axes`] provides.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Minimum number of fields in a record (no confidence).
pub const MIN_NUM_FIELDS: usize = 6;

/// Maximum number of fields in a record (with confidence).
pub const MAX_NUM_FIELDS: usize = 7;

/// Confidence assumed when the record doesn't carry one.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose record exactly as reported by the vision co-processor, in camera axes.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct VisionPose {
    /// Units: meters, camera right
    pub x_m: f64,

    /// Units: meters, camera up
    pub y_m: f64,

    /// Units: meters, camera backward
    pub z_m: f64,

    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians
    pub yaw_rad: f64,

    /// Units: radians
    pub roll_rad: f64,

    /// Self reported reliability, `None` if the record didn't include it.
    pub confidence: Option<f64>,
}

/// A vision pose converted into robot axes.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct VisionFix {
    /// Units: meters, right positive
    pub x_m: f64,

    /// Units: meters, forward positive
    pub y_m: f64,

    /// Units: meters, up positive
    pub z_m: f64,

    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians, counter-clockwise positive
    pub yaw_rad: f64,

    /// Units: radians
    pub roll_rad: f64,

    /// Reliability in the range [0, 1]
    pub confidence: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while parsing a vision record.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VisionParseError {
    #[error(
        "Expected between {} and {} fields in the vision record, found {0}",
        MIN_NUM_FIELDS,
        MAX_NUM_FIELDS
    )]
    WrongNumFields(usize),

    #[error("Field {index} of the vision record (\"{value}\") is not a number")]
    InvalidField { index: usize, value: String },

    #[error("Field {0} of the vision record is not finite")]
    NonFiniteField(usize),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl FromStr for VisionPose {
    type Err = VisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();

        if fields.len() < MIN_NUM_FIELDS || fields.len() > MAX_NUM_FIELDS {
            return Err(VisionParseError::WrongNumFields(fields.len()));
        }

        let mut values = [0f64; MAX_NUM_FIELDS];
        for (index, field) in fields.iter().enumerate() {
            let value = field
                .parse::<f64>()
                .map_err(|_| VisionParseError::InvalidField {
                    index,
                    value: field.to_string(),
                })?;

            if !value.is_finite() {
                return Err(VisionParseError::NonFiniteField(index));
            }

            values[index] = value;
        }

        Ok(Self {
            x_m: values[0],
            y_m: values[1],
            z_m: values[2],
            pitch_rad: values[3],
            yaw_rad: values[4],
            roll_rad: values[5],
            confidence: match fields.len() {
                MAX_NUM_FIELDS => Some(values[6]),
                _ => None,
            },
        })
    }
}

impl VisionPose {
    /// Convert the record from camera axes into robot axes.
    ///
    /// Camera backward becomes robot backward, so the forward component is the negated camera z,
    /// and camera up becomes robot z. Roll is mirrored by the same flip. A missing confidence is
    /// taken as [`DEFAULT_CONFIDENCE`], and any reported value is clamped into [0, 1].
    pub fn to_robot_axes(&self) -> VisionFix {
        VisionFix {
            x_m: self.x_m,
            y_m: -self.z_m,
            z_m: self.y_m,
            pitch_rad: self.pitch_rad,
            yaw_rad: self.yaw_rad,
            roll_rad: -self.roll_rad,
            confidence: self
                .confidence
                .unwrap_or(DEFAULT_CONFIDENCE)
                .max(0.0)
                .min(1.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_six_fields() {
        let p: VisionPose = "1.0 2.0 -3.0 0.1 0.2 0.3".parse().unwrap();
        assert_eq!(p.x_m, 1.0);
        assert_eq!(p.z_m, -3.0);
        assert_eq!(p.roll_rad, 0.3);
        assert_eq!(p.confidence, None);
    }

    #[test]
    fn test_parse_seven_fields() {
        let p: VisionPose = "  1 2 3\t4 5 6 0.75\n".parse().unwrap();
        assert_eq!(p.yaw_rad, 5.0);
        assert_eq!(p.confidence, Some(0.75));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "1 2 3 4 5".parse::<VisionPose>(),
            Err(VisionParseError::WrongNumFields(5))
        );
        assert_eq!(
            "1 2 3 4 5 6 7 8".parse::<VisionPose>(),
            Err(VisionParseError::WrongNumFields(8))
        );
        assert_eq!(
            "1 2 three 4 5 6".parse::<VisionPose>(),
            Err(VisionParseError::InvalidField {
                index: 2,
                value: "three".into()
            })
        );
        assert_eq!(
            "1 2 3 NaN 5 6".parse::<VisionPose>(),
            Err(VisionParseError::NonFiniteField(3))
        );
    }

    #[test]
    fn test_to_robot_axes() {
        let fix = "0.5 0.2 -1.5 0.1 -0.4 0.3"
            .parse::<VisionPose>()
            .unwrap()
            .to_robot_axes();

        assert_eq!(fix.x_m, 0.5);
        assert_eq!(fix.y_m, 1.5);
        assert_eq!(fix.z_m, 0.2);
        assert_eq!(fix.pitch_rad, 0.1);
        assert_eq!(fix.yaw_rad, -0.4);
        assert_eq!(fix.roll_rad, -0.3);
        assert_eq!(fix.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_confidence_clamped() {
        let high = "0 0 0 0 0 0 1.7".parse::<VisionPose>().unwrap();
        let low = "0 0 0 0 0 0 -0.2".parse::<VisionPose>().unwrap();
        assert_eq!(high.to_robot_axes().confidence, 1.0);
        assert_eq!(low.to_robot_axes().confidence, 0.0);
    }
}
