//! # Communications interface crate.
//!
//! Provides the interface types exchanged between the navigation core and its
//! external collaborators (vision co-processor, drive actuators).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for equipment (vision, drive)
pub mod eqpt;
