//! # Fusion module
//!
//! The fusion engine owns the odometry stack and produces the single authoritative robot pose.
//! Wheel odometry is stepped at the control rate, while vision poses arrive asynchronously from
//! the vision co-processor and, when trusted, are written back into the odometry stack as a tare
//! so that integration carries on from the corrected frame.
//!
//! Both entry points go through a [`FusionHandle`], which serialises them on one lock.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod filter;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use crate::{
    odom::{OdomError, SensorFrame, Velocity},
    pose::FusedPose,
    shared::lock_or_recover,
};
use comms_if::eqpt::vision::VisionParseError;
use util::{module::State, params::LoadError};

pub use filter::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Diagnostics from a fusion step.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct FusionReport {
    /// Whether the most recent vision pose passed the confidence gate.
    pub approving_frames: bool,

    /// Whether vision poses are currently being applied at all.
    pub accepting_fuses: bool,

    pub velocity: Velocity,
}

/// Thread safe handle to a fusion engine, shared between the control loop and the vision
/// receiver.
#[derive(Clone)]
pub struct FusionHandle {
    inner: Arc<Mutex<OdomFusion>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What happened to a vision pose handed to the fusion engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FuseOutcome {
    /// Fusion is suspended or the mode ignores vision.
    Ignored,

    /// The pose's confidence was below the threshold.
    Rejected,

    /// The pose was applied.
    Accepted,
}

/// Errors which can occur during fusion.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("Could not load fusion parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Fusion parameter {0} has an invalid value ({1})")]
    InvalidParam(&'static str, f64),

    #[error("Odometry configuration error: {0}")]
    OdomError(#[from] OdomError),

    #[error("Rejected a non-finite sensor frame: {0:?}")]
    NonFiniteSensors(SensorFrame),

    #[error("Rejected a non-finite vision pose: {0:?}")]
    NonFiniteVision(FusedPose),

    #[error("Could not parse the vision message: {0}")]
    VisionParseError(#[from] VisionParseError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FusionHandle {
    pub fn new(fusion: OdomFusion) -> Self {
        Self {
            inner: Arc::new(Mutex::new(fusion)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OdomFusion> {
        lock_or_recover(&self.inner, "Fusion")
    }

    /// Run one control tick of fusion, returning a snapshot of the pose and the report.
    pub fn proc(&self, sensors: &SensorFrame) -> Result<(FusedPose, FusionReport), FusionError> {
        self.lock().proc(sensors)
    }

    /// Hand a parsed vision pose, already in robot centre coordinates, to the engine.
    pub fn on_vision(&self, vision: FusedPose) -> Result<FuseOutcome, FusionError> {
        self.lock().on_vision(vision)
    }

    /// Hand a raw vision record (camera axes, camera position) to the engine.
    pub fn on_vision_message(&self, payload: &str) -> Result<FuseOutcome, FusionError> {
        self.lock().on_vision_message(payload)
    }

    /// A snapshot of the current pose.
    pub fn pose(&self) -> FusedPose {
        self.lock().pose()
    }

    pub fn set_pose(&self, x: f64, y: f64, yaw: f64) {
        self.lock().set_pose(x, y, yaw)
    }

    pub fn accept_fuses(&self) {
        self.lock().accept_fuses()
    }

    pub fn reject_fuses(&self) {
        self.lock().reject_fuses()
    }

    pub fn approving_frames(&self) -> bool {
        self.lock().approving_frames()
    }
}
