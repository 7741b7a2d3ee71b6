//! # Odometry module
//!
//! Dead reckoning of the robot pose from two unpowered tracking wheels (one measuring forward
//! travel, one sideways travel) and the inertial heading.
//!
//! The stack is split into two owned stages:
//!
//! - [`WheelOdometry`] integrates the tracker deltas into the pose of the tracking centre using
//!   an arc model of each tick's motion.
//! - [`OdomFrame`] relocates that pose to the robot's geometric centre and provides the velocity.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frame;
mod params;
mod wheel;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use frame::*;
pub use params::*;
pub use wheel::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One synchronous read of the odometry sensors.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Accumulated forward tracker travel.
    ///
    /// Units: meters
    pub forward_m: f64,

    /// Accumulated sideways tracker travel, right positive.
    ///
    /// Units: meters
    pub sideways_m: f64,

    /// Inertial heading, counter-clockwise positive.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians
    pub roll_rad: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of odometry sensor data, read once at the start of each control cycle.
pub trait OdomSensors {
    fn read(&mut self) -> SensorFrame;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while configuring odometry.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OdomError {
    #[error("The {0} must be finite, got {1}")]
    NonFinite(&'static str, f64),

    #[error("The {0} must be positive, got {1}")]
    NotPositive(&'static str, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorFrame {
    /// Returns true if every reading is finite.
    pub fn is_finite(&self) -> bool {
        self.forward_m.is_finite()
            && self.sideways_m.is_finite()
            && self.heading_rad.is_finite()
            && self.pitch_rad.is_finite()
            && self.roll_rad.is_finite()
    }
}

/// Check that a configuration value is finite.
pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<f64, OdomError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OdomError::NonFinite(name, value))
    }
}

/// Check that a configuration value is finite and strictly positive.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64, OdomError> {
    check_finite(name, value)?;

    if value > 0.0 {
        Ok(value)
    } else {
        Err(OdomError::NotPositive(name, value))
    }
}
