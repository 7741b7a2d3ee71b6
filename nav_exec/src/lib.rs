//! # Navigation library.
//!
//! This library allows other crates in the workspace (and the benches and integration tests) to
//! access items defined inside the navigation executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pose algebra - the 2D pose value type and the fused 3D pose
pub mod pose;

/// Odometry - dead reckoning from the tracking wheels and the inertial heading
pub mod odom;

/// Fusion - merges wheel odometry with the asynchronous vision pose
pub mod fusion;

/// Pursuit - Dubins path generation and the lookahead tracking query
pub mod pursuit;

/// Conductor - converts a path or turn into drive and turn voltages
pub mod conductor;

/// Scheduler - fixed period dispatch of the navigation nodes
pub mod sched;

/// Data store - per cycle data shared between the nodes
pub mod data_store;

/// Simulation - a kinematic differential drive robot standing in for the hardware
pub mod sim;

/// Shared state helpers
pub mod shared;
