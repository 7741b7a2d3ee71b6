//! # Simulated robot
//!
//! A kinematic differential drive robot used in place of the hardware by the executable and the
//! closed loop tests. Drive demands move the true pose, and the tracking wheels, inertial heading
//! and vision camera are all derived from it.
//!
//! Tracker readings are generated from the same arc model the odometry integrator assumes, so
//! with no slip the odometry reproduces the true pose.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use crate::{
    conductor::DriveActuator,
    odom::{OdomParams, OdomSensors, SensorFrame, TrackerParams},
    pose::Pose2D,
    pursuit::Waypoint,
    shared::lock_or_recover,
};
use comms_if::eqpt::drive::DriveDems;
use util::maths::{ang_dist, safe_div};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Rotations smaller than this are treated as straight line motion.
const STRAIGHT_EPS_RAD: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation parameters, loaded from `sim.toml`.
#[derive(Deserialize, Debug, Clone)]
pub struct SimParams {
    /// Simulation time step, one per drive demand.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// Distance between the left and right wheels.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Wheel speed per volt of demand.
    ///
    /// Units: meters/second/volt
    pub k_v: f64,

    /// Fraction of forward travel the forward tracker fails to register.
    #[serde(default)]
    pub forward_slip: f64,

    /// Cycles between vision poses, 0 for no vision.
    #[serde(default)]
    pub vision_period_cycles: u64,

    /// Confidence reported with each vision pose.
    #[serde(default = "default_confidence")]
    pub vision_confidence: f64,

    /// True starting pose.
    #[serde(default)]
    pub start: Pose2D,

    /// Path to drive.
    pub waypoints: Vec<Waypoint>,

    /// Heading to turn to once the path is complete.
    #[serde(default)]
    pub final_turn_yaw: Option<f64>,
}

/// The simulated robot.
#[derive(Debug, Clone)]
pub struct SimRobot {
    params: SimParams,

    /// Pose of the tracking centre relative to the robot centre.
    tracker_offset: Pose2D,
    forward_tracker: TrackerParams,
    sideways_tracker: TrackerParams,

    /// Pose of the camera relative to the robot centre.
    camera_offset: Pose2D,

    truth: Pose2D,
    start_yaw: f64,

    /// Accumulated encoder angles.
    forward_enc_rad: f64,
    sideways_enc_rad: f64,

    time_s: f64,
}

/// Thread safe handle to a simulated robot, acting as both the sensors and the actuator.
#[derive(Clone)]
pub struct SimHandle {
    inner: Arc<Mutex<SimRobot>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRobot {
    /// Create a robot at the start pose with tracking wheels and camera matching the given
    /// configuration.
    pub fn new(params: SimParams, odom: &OdomParams, camera_offset: Pose2D) -> Self {
        Self {
            truth: params.start,
            start_yaw: params.start.yaw,
            tracker_offset: odom.offset,
            forward_tracker: odom.forward_tracker,
            sideways_tracker: odom.sideways_tracker,
            camera_offset,
            forward_enc_rad: 0.0,
            sideways_enc_rad: 0.0,
            time_s: 0.0,
            params,
        }
    }

    /// Apply the demands for one time step.
    pub fn advance(&mut self, dems: &DriveDems) {
        let dt = self.params.step_period_s;
        let v = self.params.k_v * (dems.left_v + dems.right_v) / 2.0;
        let omega = safe_div(
            self.params.k_v * (dems.right_v - dems.left_v),
            self.params.track_width_m,
            0.0,
        );

        let d_theta = omega * dt;
        let mid = self.truth.yaw + d_theta / 2.0;

        let old_tracker = self.truth.compose(&self.tracker_offset);
        self.truth = Pose2D::new(
            self.truth.x - v * dt * mid.sin(),
            self.truth.y + v * dt * mid.cos(),
            self.truth.yaw + d_theta,
        );
        let new_tracker = self.truth.compose(&self.tracker_offset);

        // Invert the integrator's arc model to find what each tracker measured
        let world = Vector2::new(new_tracker.x - old_tracker.x, new_tracker.y - old_tracker.y);
        let local = Rotation2::new(-(old_tracker.yaw + d_theta / 2.0)) * world;

        let (d_sideways, d_forward) = if d_theta.abs() < STRAIGHT_EPS_RAD {
            (local[0], local[1])
        } else {
            let chord = 2.0 * (-d_theta / 2.0).sin();
            (
                -d_theta * (local[0] / chord - self.sideways_tracker.center_offset_m),
                -d_theta * (local[1] / chord - self.forward_tracker.center_offset_m),
            )
        };

        self.forward_enc_rad += self
            .forward_tracker
            .distance_to_rotation(d_forward * (1.0 - self.params.forward_slip));
        self.sideways_enc_rad += self.sideways_tracker.distance_to_rotation(d_sideways);
        self.time_s += dt;

        trace!("Sim truth: {:?}", self.truth);
    }

    /// What the sensors read now.
    pub fn sensor_frame(&self) -> SensorFrame {
        SensorFrame {
            forward_m: self.forward_tracker.rotation_to_distance(self.forward_enc_rad),
            sideways_m: self.sideways_tracker.rotation_to_distance(self.sideways_enc_rad),
            heading_rad: ang_dist(self.start_yaw, self.truth.yaw),
            pitch_rad: 0.0,
            roll_rad: 0.0,
        }
    }

    /// A vision record for the current true pose, in camera axes at the camera position.
    pub fn vision_message(&self) -> String {
        let camera = self.truth.compose(&self.camera_offset);

        // Camera axes: x right, y up, z backward
        format!(
            "{} {} {} {} {} {} {}",
            camera.x,
            0.0,
            -camera.y,
            0.0,
            camera.yaw,
            0.0,
            self.params.vision_confidence
        )
    }

    pub fn truth(&self) -> Pose2D {
        self.truth
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }
}

impl SimHandle {
    pub fn new(robot: SimRobot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(robot)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimRobot> {
        lock_or_recover(&self.inner, "Sim")
    }

    pub fn truth(&self) -> Pose2D {
        self.lock().truth()
    }

    pub fn vision_message(&self) -> String {
        self.lock().vision_message()
    }
}

impl OdomSensors for SimHandle {
    fn read(&mut self) -> SensorFrame {
        self.lock().sensor_frame()
    }
}

impl DriveActuator for SimHandle {
    fn send_dems(&mut self, dems: &DriveDems) {
        self.lock().advance(dems)
    }
}

fn default_confidence() -> f64 {
    1.0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::odom::OdomFrame;
    use std::f64::consts::FRAC_PI_2;

    fn sim_params() -> SimParams {
        SimParams {
            step_period_s: 0.01,
            track_width_m: 0.3,
            k_v: 0.1,
            forward_slip: 0.0,
            vision_period_cycles: 0,
            vision_confidence: 0.9,
            start: Pose2D::zero(),
            waypoints: Vec::new(),
            final_turn_yaw: None,
        }
    }

    fn odom_params(offset: Pose2D) -> OdomParams {
        let tracker = |center_offset_m| TrackerParams {
            wheel_diameter_m: 0.05,
            gear_ratio: 1.0,
            center_offset_m,
        };
        OdomParams {
            step_period_s: 0.01,
            forward_tracker: tracker(0.02),
            sideways_tracker: tracker(-0.05),
            offset,
        }
    }

    #[test]
    fn test_kinematics() {
        let mut robot = SimRobot::new(sim_params(), &odom_params(Pose2D::zero()), Pose2D::zero());

        // 1 V each side for 1 s is 0.1 m straight ahead
        for _ in 0..100 {
            robot.advance(&DriveDems {
                left_v: 1.0,
                right_v: 1.0,
            });
        }
        assert!(robot.truth().dist(&Pose2D::new(0.0, 0.1, 0.0)) < 1e-9);
        assert!((robot.sensor_frame().forward_m - 0.1).abs() < 1e-9);
        assert!((robot.time_s() - 1.0).abs() < 1e-9);

        // Opposite demands spin on the spot, counter-clockwise for a faster right side
        let before = robot.truth();
        for _ in 0..100 {
            robot.advance(&DriveDems {
                left_v: -1.0,
                right_v: 1.0,
            });
        }
        let after = robot.truth();
        assert!(after.dist(&before) < 1e-9);
        assert!((ang_dist(before.yaw, after.yaw) - 0.2 / 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_odometry_tracks_truth() {
        let offset = Pose2D::new(0.03, -0.04, 0.0);
        let odom = odom_params(offset);
        let mut robot = SimRobot::new(sim_params(), &odom, Pose2D::zero());
        let mut frame = OdomFrame::from_params(&odom).unwrap();
        frame.tare(0.0, 0.0, 0.0);

        for i in 0..500 {
            let dems = if i < 250 {
                DriveDems {
                    left_v: 2.0,
                    right_v: 3.0,
                }
            } else {
                DriveDems {
                    left_v: 3.0,
                    right_v: -1.0,
                }
            };
            robot.advance(&dems);
            frame.step(&robot.sensor_frame());
        }

        let truth = robot.truth();
        let odom_pose = frame.pose();
        assert!(truth.dist(&odom_pose) < 1e-6);
        assert!(ang_dist(truth.yaw, odom_pose.yaw).abs() < 1e-9);
    }

    #[test]
    fn test_vision_message() {
        let camera_offset = Pose2D::new(0.0, 0.1, 0.0);
        let mut params = sim_params();
        params.start = Pose2D::new(1.0, 2.0, FRAC_PI_2);
        let robot = SimRobot::new(params, &odom_params(Pose2D::zero()), camera_offset);

        let fields: Vec<f64> = robot
            .vision_message()
            .split_whitespace()
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(fields.len(), 7);

        // Facing -x, so the camera sits 0.1 m toward -x of the centre
        assert!((fields[0] - 0.9).abs() < 1e-9);
        assert!((fields[2] + 2.0).abs() < 1e-9);
        assert!((fields[4] - FRAC_PI_2).abs() < 1e-9);
        assert_eq!(fields[6], 0.9);
    }

    #[test]
    fn test_handle() {
        let mut handle = SimHandle::new(SimRobot::new(
            sim_params(),
            &odom_params(Pose2D::zero()),
            Pose2D::zero(),
        ));

        handle.send_dems(&DriveDems {
            left_v: 10.0,
            right_v: 10.0,
        });
        assert!((handle.read().forward_m - 0.01).abs() < 1e-9);
        assert!((handle.truth().y - 0.01).abs() < 1e-9);
    }
}
