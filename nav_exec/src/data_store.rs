//! # Data Store

use comms_if::eqpt::drive::DriveDems;

use crate::{
    conductor::{ConductorReport, PursuitOutput},
    fusion::FusionReport,
    odom::SensorFrame,
    pose::FusedPose,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per cycle data shared between the navigation nodes.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Session elapsed time at the start of the cycle
    pub cycle_time_s: f64,

    // Sensors
    /// The sensor frame read at the start of the cycle
    pub sensor_frame: SensorFrame,

    // Fusion
    /// Snapshot of the fused pose after this cycle's fusion step
    pub pose: FusedPose,
    pub fusion_report: FusionReport,

    // Conductor
    pub pursuit: PursuitOutput,
    pub conductor_report: ConductorReport,

    // Drive
    pub drive_dems: DriveDems,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the outputs which must be recomputed every cycle. The pose persists so the
    /// conductor always has the latest estimate.
    pub fn cycle_start(&mut self) {
        self.pursuit = PursuitOutput::default();
        self.drive_dems = DriveDems::stop();

        self.cycle_time_s = util::session::get_elapsed_seconds();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}
