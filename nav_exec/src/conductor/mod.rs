//! # Conductor module
//!
//! The conductor turns an active motion, either a path to follow or a heading to turn to, into
//! drive and turn voltages. Each step it asks the path (or the heading target) for an estimate,
//! runs the distance and steering errors through their PID controllers and slew limiters, and
//! decides whether the motion is complete.
//!
//! The conductor is idle until a motion is generated, and returns to idle when the motion
//! completes, when the estimate becomes invalid, or when it is disabled.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod drive;
mod params;
mod pid;
mod slew;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::sync::{Arc, Mutex};

// Internal
use crate::{
    pose::Pose2D,
    pursuit::{PathError, PursuitEstimate},
};
use util::params::LoadError;

pub use drive::*;
pub use params::*;
pub use pid::*;
pub use slew::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A conductor shared between the control loop and whoever commands motions.
pub type SharedConductor = Arc<Mutex<PursuitConductor>>;

/// Output of one conductor step.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct PursuitOutput {
    /// If false the robot must be stopped.
    pub is_valid: bool,

    /// The motion is finished, or there was none.
    pub is_complete: bool,

    /// Units: volts
    pub drive_power_v: f64,

    /// Units: volts, positive turns counter-clockwise
    pub turn_power_v: f64,

    /// The estimate the powers were computed from.
    pub estimate: PursuitEstimate,
}

/// Conductor status report.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct ConductorReport {
    pub enabled: bool,
    pub is_turn: bool,
    pub forward_settled: bool,
    pub turn_settled: bool,
    pub target_index: Option<usize>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur in the conductor.
#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    #[error("Could not load conductor parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Conductor parameter {0} has an invalid value ({1})")]
    InvalidParam(&'static str, f64),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("No Dubins path exists through the waypoints")]
    UnsolvablePath,

    #[error("Turn target is not finite ({0})")]
    NonFiniteTarget(f64),

    #[error("Rejected a non-finite pose: {0:?}")]
    NonFinitePose(Pose2D),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PursuitOutput {
    /// Output for when there is nothing to do.
    pub fn complete(estimate: PursuitEstimate) -> Self {
        Self {
            is_valid: true,
            is_complete: true,
            drive_power_v: 0.0,
            turn_power_v: 0.0,
            estimate,
        }
    }

    /// Output for when the robot must stop because no estimate could be made.
    pub fn invalid(estimate: PursuitEstimate) -> Self {
        Self {
            estimate,
            ..Default::default()
        }
    }
}
