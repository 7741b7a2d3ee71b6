//! # Pursuit module
//!
//! Builds a drivable path through a sequence of waypoints out of Dubins curves, and answers the
//! lookahead tracking query used by the conductor each tick.
//!
//! The path is sampled into a dense polyline of poses. Checkpoints placed at the middle and end of
//! each Dubins segment bound the window in which the tracking query searches, so once a part of
//! the path has been passed it can't be locked onto again, even where the path crosses itself.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod dubins;
mod params;
mod path;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use dubins::{DubinsConfig, DubinsPath, DubinsWord};
pub use params::*;
pub use path::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building a path.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("A path needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Path parameter {0} has an invalid value ({1})")]
    InvalidParam(&'static str, f64),
}
