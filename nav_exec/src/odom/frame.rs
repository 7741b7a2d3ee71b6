//! # Odometry frame
//!
//! The trackers rarely sit at the robot's geometric centre. `OdomFrame` owns the wheel odometry
//! integrator and applies the fixed offset between the tracking centre and the robot centre in
//! both directions: tares given in robot coordinates are moved onto the tracking centre, and the
//! integrated tracking centre pose is moved back onto the robot centre each step.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{check_positive, OdomError, OdomParams, SensorFrame, WheelOdometry};
use crate::pose::Pose2D;
use util::maths::{ang_dist, safe_div};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default control tick period.
pub const DEFAULT_STEP_PERIOD_S: f64 = 0.01;

/// Magnitude returned for a velocity if the step period is somehow zero.
const VELOCITY_SATURATION: f64 = 1e3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The wheel odometry pose relocated to the robot centre.
#[derive(Debug, Clone, Serialize)]
pub struct OdomFrame {
    odom: WheelOdometry,
    offset: Pose2D,
    inverse_offset: Pose2D,

    pose: Pose2D,
    last_pose: Pose2D,

    step_period_s: f64,

    /// True if a step has run since the velocity was last read.
    is_clean: bool,
}

/// Robot velocity in the world frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct Velocity {
    /// Units: meters/second
    pub vx: f64,

    /// Units: meters/second
    pub vy: f64,

    /// Units: radians/second, counter-clockwise positive
    pub omega: f64,

    /// False if no step has run since the previous read, in which case the value is stale.
    pub is_clean: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OdomFrame {
    fn default() -> Self {
        Self {
            odom: WheelOdometry::new(),
            offset: Pose2D::zero(),
            inverse_offset: Pose2D::zero(),
            pose: Pose2D::zero(),
            last_pose: Pose2D::zero(),
            step_period_s: DEFAULT_STEP_PERIOD_S,
            is_clean: false,
        }
    }
}

impl OdomFrame {
    /// Create a new frame around the given integrator.
    pub fn new(odom: WheelOdometry, offset: Pose2D, step_period_s: f64) -> Result<Self, OdomError> {
        check_positive("odometry step period", step_period_s)?;

        let mut frame = Self {
            odom,
            offset,
            inverse_offset: offset.inverse(),
            step_period_s,
            ..Default::default()
        };
        frame.pose = frame.relocate(&frame.odom.pose());
        frame.last_pose = frame.pose;

        Ok(frame)
    }

    /// Build the full odometry stack from its parameters.
    pub fn from_params(params: &OdomParams) -> Result<Self, OdomError> {
        params.validate()?;

        let mut odom = WheelOdometry::new();
        odom.set_physical_distances(
            params.forward_tracker.center_offset_m,
            params.sideways_tracker.center_offset_m,
        )?;

        Self::new(odom, params.offset, params.step_period_s)
    }

    /// Redefine the robot centre pose.
    pub fn tare(&mut self, x: f64, y: f64, yaw: f64) {
        let robot = Pose2D::new(x, y, yaw);
        let tracker = robot.compose(&self.offset);

        self.odom.tare(tracker.x, tracker.y, tracker.yaw);

        self.pose = robot;
        self.last_pose = robot;
        self.is_clean = false;
    }

    /// Advance the integrator and recompute the robot centre pose.
    pub fn step(&mut self, frame: &SensorFrame) {
        self.odom.update_from_frame(frame);

        self.last_pose = self.pose;
        self.pose = self.relocate(&self.odom.pose());
        self.is_clean = true;
    }

    /// The finite difference velocity over the last step.
    ///
    /// Reading the velocity consumes its clean flag, a second read without an intervening step
    /// reports `is_clean == false`.
    pub fn velocity_vector(&mut self) -> Velocity {
        let dt = self.step_period_s;
        let v = Velocity {
            vx: safe_div(self.pose.x - self.last_pose.x, dt, VELOCITY_SATURATION),
            vy: safe_div(self.pose.y - self.last_pose.y, dt, VELOCITY_SATURATION),
            omega: safe_div(
                ang_dist(self.last_pose.yaw, self.pose.yaw),
                dt,
                VELOCITY_SATURATION,
            ),
            is_clean: self.is_clean,
        };

        self.is_clean = false;

        v
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn offset(&self) -> Pose2D {
        self.offset
    }

    pub fn odom(&self) -> &WheelOdometry {
        &self.odom
    }

    pub fn step_period_s(&self) -> f64 {
        self.step_period_s
    }

    fn relocate(&self, tracker: &Pose2D) -> Pose2D {
        if self.offset.is_zero() {
            *tracker
        } else {
            tracker.compose(&self.inverse_offset)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn frame(heading_rad: f64, forward_m: f64) -> SensorFrame {
        SensorFrame {
            forward_m,
            heading_rad,
            ..Default::default()
        }
    }

    #[test]
    fn test_tare_round_trip() {
        let offset = Pose2D::new(0.0, -0.1, 0.0);
        let mut f = OdomFrame::new(WheelOdometry::new(), offset, 0.01).unwrap();
        f.tare(1.0, 2.0, 0.5);
        assert!(f.pose().dist(&Pose2D::new(1.0, 2.0, 0.5)) < EPS);

        // The tracking centre is offset from the robot centre
        let tracker = f.odom().pose();
        assert!((tracker.dist(&f.pose()) - 0.1).abs() < EPS);

        // A step with no motion leaves the robot centre where it was tared
        f.step(&frame(0.0, 0.0));
        assert!(f.pose().dist(&Pose2D::new(1.0, 2.0, 0.5)) < EPS);
        assert!(ang_dist(f.pose().yaw, 0.5).abs() < EPS);
    }

    #[test]
    fn test_rotation_about_centre() {
        // Tracking centre 0.1 m behind the robot centre. Rotating the robot about its centre
        // swings the tracking centre sideways along a circle, but the robot pose must stay put.
        let offset = Pose2D::new(0.0, -0.1, 0.0);
        let mut f = OdomFrame::new(WheelOdometry::new(), offset, 0.01).unwrap();
        f.tare(0.0, 0.0, 0.0);

        f.step(&SensorFrame {
            sideways_m: 0.1 * FRAC_PI_2,
            heading_rad: FRAC_PI_2,
            ..Default::default()
        });

        assert!(f.pose().dist(&Pose2D::zero()) < EPS);
        assert!(ang_dist(f.pose().yaw, FRAC_PI_2).abs() < EPS);

        // While the tracking centre has swung round to the right
        let tracker = f.odom().pose();
        assert!((tracker.x - 0.1).abs() < EPS);
        assert!(tracker.y.abs() < EPS);
    }

    #[test]
    fn test_zero_offset_passthrough() {
        let mut f = OdomFrame::new(WheelOdometry::new(), Pose2D::zero(), 0.01).unwrap();
        f.step(&frame(0.0, 0.3));
        assert_eq!(f.pose(), f.odom().pose());
    }

    #[test]
    fn test_velocity() {
        let mut f = OdomFrame::new(WheelOdometry::new(), Pose2D::zero(), 0.01).unwrap();

        f.step(&frame(0.0, 0.01));
        let v = f.velocity_vector();
        assert!(v.is_clean);
        assert!(v.vx.abs() < EPS);
        assert!((v.vy - 1.0).abs() < 1e-6);
        assert!(v.omega.abs() < EPS);

        // No step since the last read
        assert!(!f.velocity_vector().is_clean);

        f.step(&frame(0.02, 0.01));
        let v = f.velocity_vector();
        assert!(v.is_clean);
        assert!((v.omega - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_period() {
        assert!(OdomFrame::new(WheelOdometry::new(), Pose2D::zero(), 0.0).is_err());
    }
}
