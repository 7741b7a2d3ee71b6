//! # Drive Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Voltage demands for the two independently addressable drive motor groups.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct DriveDems {
    /// Left motor group demand.
    ///
    /// Units: volts, positive drives the robot forwards
    pub left_v: f64,

    /// Right motor group demand.
    ///
    /// Units: volts, positive drives the robot forwards
    pub right_v: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl DriveDems {
    /// Demands which bring both sides to a stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Returns true if both sides are demanded to be stationary.
    pub fn is_stop(&self) -> bool {
        self.left_v == 0.0 && self.right_v == 0.0
    }
}
