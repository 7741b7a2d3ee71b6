//! # Scheduler
//!
//! Runs the navigation nodes once per control cycle in the order they were added, and keeps the
//! cycle cadence with absolute deadlines.
//!
//! The sensors are read once at the start of each cycle so every node sees the same frame. The
//! drive node is the only one which touches the actuator, and it sends a stop whenever the
//! conductor's output is invalid.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod timer;

pub use timer::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};

// Internal
use crate::{
    conductor::{DriveActuator, DriveMix, PursuitOutput, SharedConductor},
    data_store::DataStore,
    fusion::FusionHandle,
    odom::OdomSensors,
    pursuit::PursuitEstimate,
    shared::lock_or_recover,
};
use comms_if::eqpt::drive::DriveDems;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Dispatches the nodes each cycle.
pub struct Scheduler {
    nodes: Vec<Node>,
    enabled: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A stepped component of the navigation stack.
pub enum Node {
    /// Steps odometry and fusion, producing the pose.
    Fusion(FusionHandle),

    /// Steps the conductor on the pose, producing drive and turn powers.
    Conductor(SharedConductor),

    /// Mixes the powers into side demands and sends them.
    Drive(DriveMix),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// An enabled scheduler with no nodes.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            enabled: true,
        }
    }

    /// Add a node, run after all those already added.
    pub fn add(&mut self, node: Node) {
        debug!("Added {} node", node.name());
        self.nodes.push(node);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop dispatching nodes. While disabled each cycle only sends a stop to the actuator.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run one control cycle.
    pub fn run_cycle(
        &mut self,
        ds: &mut DataStore,
        sensors: &mut dyn OdomSensors,
        actuator: &mut dyn DriveActuator,
    ) {
        ds.cycle_start();

        if !self.enabled {
            actuator.send_dems(&ds.drive_dems);
            ds.cycle_end();
            return;
        }

        ds.sensor_frame = sensors.read();

        for node in self.nodes.iter() {
            match node {
                Node::Fusion(fusion) => match fusion.proc(&ds.sensor_frame) {
                    Ok((pose, report)) => {
                        ds.pose = pose;
                        ds.fusion_report = report;
                    }
                    Err(e) => warn!("Error during fusion processing: {}", e),
                },
                Node::Conductor(conductor) => {
                    let result = lock_or_recover(conductor, "Conductor").proc(&ds.pose.pose2d());

                    match result {
                        Ok((output, report)) => {
                            ds.pursuit = output;
                            ds.conductor_report = report;
                        }
                        Err(e) => {
                            warn!("Error during conductor processing: {}", e);
                            ds.pursuit = PursuitOutput::invalid(PursuitEstimate::invalid());
                        }
                    }
                }
                Node::Drive(mix) => {
                    ds.drive_dems = if ds.pursuit.is_valid {
                        mix.mix(ds.pursuit.drive_power_v, ds.pursuit.turn_power_v)
                    } else {
                        DriveDems::stop()
                    };
                    actuator.send_dems(&ds.drive_dems);
                }
            }
        }

        trace!(
            "Cycle {}: pose {:?}, dems {:?}",
            ds.num_cycles,
            ds.pose.pose2d(),
            ds.drive_dems
        );

        ds.cycle_end();
    }
}

impl Node {
    fn name(&self) -> &'static str {
        match self {
            Node::Fusion(_) => "fusion",
            Node::Conductor(_) => "conductor",
            Node::Drive(_) => "drive",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        conductor::{AxisParams, ConductorParams, DriveParams, PidParams, PursuitConductor},
        fusion::{FusionMode, FusionParams, OdomFusion},
        odom::{OdomFrame, SensorFrame, WheelOdometry},
        pose::Pose2D,
        pursuit::{PathParams, Waypoint},
    };
    use std::sync::{Arc, Mutex};

    struct FixedSensors(SensorFrame);

    impl OdomSensors for FixedSensors {
        fn read(&mut self) -> SensorFrame {
            self.0
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<DriveDems>);

    impl DriveActuator for Recorder {
        fn send_dems(&mut self, dems: &DriveDems) {
            self.0.push(*dems)
        }
    }

    fn fusion() -> FusionHandle {
        let frame = OdomFrame::new(WheelOdometry::new(), Pose2D::zero(), 0.01).unwrap();
        let params = FusionParams {
            mode: FusionMode::WheelOdomOnly,
            min_confidence_threshold: 0.5,
            max_shift_per_tick_m: 0.01,
            max_shift_per_tick_rad: 0.01,
            vision_filter_window: 0,
            camera_offset: Pose2D::zero(),
        };
        FusionHandle::new(OdomFusion::new(params, frame).unwrap())
    }

    fn conductor() -> SharedConductor {
        let axis = |k_p| AxisParams {
            pid: PidParams {
                k_p,
                k_i: 0.0,
                k_d: 0.0,
                integral_zone: 0.0,
                settle_error: 0.02,
                settle_time_s: 0.1,
            },
            max_voltage_v: 12.0,
            slew_step_v: 0.0,
        };
        let c = PursuitConductor::new(ConductorParams {
            step_period_s: 0.01,
            path: PathParams {
                turning_radius_m: 0.3,
                lookahead_m: 0.2,
                sample_step_m: 0.01,
                landing_strip_m: None,
            },
            forward: axis(2.0),
            turning: axis(4.0),
        })
        .unwrap();

        Arc::new(Mutex::new(c))
    }

    fn scheduler(conductor: &SharedConductor) -> Scheduler {
        let mut sched = Scheduler::new();
        sched.add(Node::Fusion(fusion()));
        sched.add(Node::Conductor(conductor.clone()));
        sched.add(Node::Drive(DriveMix::new(DriveParams::default()).unwrap()));
        sched
    }

    #[test]
    fn test_idle_cycle() {
        let conductor = conductor();
        let mut sched = scheduler(&conductor);
        let mut ds = DataStore::default();
        let mut sensors = FixedSensors(SensorFrame::default());
        let mut actuator = Recorder::default();

        sched.run_cycle(&mut ds, &mut sensors, &mut actuator);

        assert_eq!(ds.num_cycles, 1);
        assert!(ds.pursuit.is_complete);
        assert_eq!(actuator.0, vec![DriveDems::stop()]);
    }

    #[test]
    fn test_driving_cycle() {
        let conductor = conductor();
        conductor
            .lock()
            .unwrap()
            .generate_path(
                &[Waypoint::with_yaw(0.0, 0.0, 0.0), Waypoint::with_yaw(0.0, 2.0, 0.0)],
                0.0,
            )
            .unwrap();

        let mut sched = scheduler(&conductor);
        let mut ds = DataStore::default();
        let mut sensors = FixedSensors(SensorFrame::default());
        let mut actuator = Recorder::default();

        sched.run_cycle(&mut ds, &mut sensors, &mut actuator);

        // Straight ahead, both sides forward and equal
        assert_eq!(actuator.0.len(), 1);
        let dems = actuator.0[0];
        assert!(dems.left_v > 0.0);
        assert!((dems.left_v - dems.right_v).abs() < 1e-6);
        assert!(ds.conductor_report.enabled);

        // Disabling stops dispatch and sends a stop
        sched.disable();
        sched.run_cycle(&mut ds, &mut sensors, &mut actuator);
        assert_eq!(actuator.0[1], DriveDems::stop());
        assert_eq!(ds.num_cycles, 2);
    }

    #[test]
    fn test_invalid_output_stops() {
        let conductor = conductor();
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(std::f64::NAN, 1.0)];
        assert!(conductor.lock().unwrap().generate_path(&waypoints, 0.0).is_err());

        let mut sched = scheduler(&conductor);
        let mut ds = DataStore::default();
        let mut sensors = FixedSensors(SensorFrame::default());
        let mut actuator = Recorder::default();

        sched.run_cycle(&mut ds, &mut sensors, &mut actuator);

        assert!(!ds.pursuit.is_valid);
        assert_eq!(actuator.0, vec![DriveDems::stop()]);
    }
}
