//! # Wheel odometry integrator
//!
//! Each tick the motion of the tracking centre is modelled as an arc about an instantaneous
//! centre of curvature. The chord of that arc, rotated by the heading halfway through the tick,
//! gives the world frame displacement. When the heading doesn't change the arc degenerates into a
//! straight line and the tracker deltas are used directly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

// Internal
use super::{check_finite, OdomError, SensorFrame};
use crate::pose::Pose2D;
use util::maths::{ang_dist, norm_angle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Integrates tracking wheel travel and heading into a pose.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WheelOdometry {
    x: f64,
    y: f64,
    orientation: f64,

    last_forward_tracker_pos: f64,
    last_sideways_tracker_pos: f64,

    forward_center_dist: f64,
    sideways_center_dist: f64,

    /// Added to the raw sensor heading so a tare survives subsequent readings.
    heading_offset: f64,

    /// The most recent raw heading from the inertial sensor.
    last_raw_heading: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelOdometry {
    /// Create a new integrator at the origin with both centre distances zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the signed distances of the trackers from the tracking centre.
    pub fn set_physical_distances(
        &mut self,
        forward_center_dist: f64,
        sideways_center_dist: f64,
    ) -> Result<(), OdomError> {
        self.forward_center_dist = check_finite("forward centre distance", forward_center_dist)?;
        self.sideways_center_dist =
            check_finite("sideways centre distance", sideways_center_dist)?;

        Ok(())
    }

    /// Advance the integrator with the latest tracker positions and raw heading.
    pub fn update_pose(
        &mut self,
        forward_tracker_pos: f64,
        sideways_tracker_pos: f64,
        heading_rad: f64,
    ) {
        let heading = norm_angle(heading_rad + self.heading_offset);
        self.last_raw_heading = heading_rad;

        let d_forward = forward_tracker_pos - self.last_forward_tracker_pos;
        let d_sideways = sideways_tracker_pos - self.last_sideways_tracker_pos;
        let d_theta = ang_dist(self.orientation, heading);

        // Local displacement as (right, forward)
        let local = if d_theta == 0.0 {
            Vector2::new(d_sideways, d_forward)
        } else {
            let chord = 2.0 * (-d_theta / 2.0).sin();
            Vector2::new(
                chord * (d_sideways / -d_theta + self.sideways_center_dist),
                chord * (d_forward / -d_theta + self.forward_center_dist),
            )
        };

        let mid_heading = self.orientation + d_theta / 2.0;
        let global = Rotation2::new(mid_heading) * local;

        self.x += global[0];
        self.y += global[1];
        self.orientation = heading;

        self.last_forward_tracker_pos = forward_tracker_pos;
        self.last_sideways_tracker_pos = sideways_tracker_pos;

        trace!(
            "Wheel odom: d_fwd {:.4} d_side {:.4} d_theta {:.5} -> ({:.4}, {:.4}, {:.4})",
            d_forward,
            d_sideways,
            d_theta,
            self.x,
            self.y,
            self.orientation
        );
    }

    /// Advance the integrator from a sensor frame.
    pub fn update_from_frame(&mut self, frame: &SensorFrame) {
        self.update_pose(frame.forward_m, frame.sideways_m, frame.heading_rad)
    }

    /// Redefine the current position and orientation.
    ///
    /// The physical distances and tracker readings are untouched. The heading offset is updated
    /// so that the next raw heading equal to the last one reads as `yaw`.
    pub fn tare(&mut self, x: f64, y: f64, yaw: f64) {
        self.x = x;
        self.y = y;
        self.orientation = norm_angle(yaw);
        self.heading_offset = ang_dist(self.last_raw_heading, self.orientation);
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.orientation)
    }

    pub fn physical_distances(&self) -> (f64, f64) {
        (self.forward_center_dist, self.sideways_center_dist)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_straight_line() {
        for &heading in &[0.0, 0.4, -2.0, PI] {
            let mut odom = WheelOdometry::new();
            odom.tare(1.0, -1.0, heading);
            let before = odom.pose();

            // Same raw heading as when tared, so no orientation change
            odom.update_pose(0.75, 0.0, 0.0);

            let after = odom.pose();
            let expected = Rotation2::new(heading) * Vector2::new(0.0, 0.75);
            assert!((after.x - before.x - expected[0]).abs() < EPS);
            assert!((after.y - before.y - expected[1]).abs() < EPS);
            assert!(ang_dist(after.yaw, heading).abs() < EPS);
        }
    }

    #[test]
    fn test_sideways() {
        let mut odom = WheelOdometry::new();
        odom.update_pose(0.0, 0.5, 0.0);
        assert!((odom.pose().x - 0.5).abs() < EPS);
        assert!(odom.pose().y.abs() < EPS);
    }

    #[test]
    fn test_arc() {
        // Quarter circle of radius 1 turning left, tracker at the tracking centre
        let mut odom = WheelOdometry::new();
        odom.update_pose(FRAC_PI_2, 0.0, FRAC_PI_2);

        let p = odom.pose();
        assert!((p.x + 1.0).abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
        assert!((p.yaw - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_arc_in_steps_matches_single_step() {
        let mut single = WheelOdometry::new();
        single.update_pose(1.0, 0.0, 0.8);

        let mut stepped = WheelOdometry::new();
        for i in 1..=10 {
            let f = i as f64 / 10.0;
            stepped.update_pose(f, 0.0, 0.8 * f);
        }

        assert!(single.pose().dist(&stepped.pose()) < EPS);
    }

    #[test]
    fn test_point_turn_with_offset_trackers() {
        // A pure rotation advances each tracker by its centre distance times the angle, which
        // must not translate the tracking centre.
        let mut odom = WheelOdometry::new();
        odom.set_physical_distances(0.12, -0.05).unwrap();

        let d_theta = 1.1;
        odom.update_pose(0.12 * d_theta, -0.05 * d_theta, d_theta);

        assert!(odom.pose().x.abs() < EPS);
        assert!(odom.pose().y.abs() < EPS);
    }

    #[test]
    fn test_tare_persists() {
        let mut odom = WheelOdometry::new();
        odom.update_pose(0.0, 0.0, 0.3);
        odom.tare(2.0, 3.0, -1.0);

        // Raw heading unchanged, so the tared heading holds and motion is straight along it
        odom.update_pose(1.0, 0.0, 0.3);
        let p = odom.pose();
        assert!(ang_dist(p.yaw, -1.0).abs() < EPS);
        assert!((p.x - (2.0 + (1.0f64).sin())).abs() < EPS);
        assert!((p.y - (3.0 + (1.0f64).cos())).abs() < EPS);

        // Subsequent raw rotation is applied on top of the tare
        odom.update_pose(1.0, 0.0, 0.5);
        assert!(ang_dist(odom.pose().yaw, -0.8).abs() < EPS);
    }

    #[test]
    fn test_tare_keeps_distances() {
        let mut odom = WheelOdometry::new();
        odom.set_physical_distances(0.1, 0.2).unwrap();
        odom.tare(0.0, 0.0, 0.0);
        assert_eq!(odom.physical_distances(), (0.1, 0.2));
    }

    #[test]
    fn test_non_finite_distances() {
        let mut odom = WheelOdometry::new();
        assert!(odom.set_physical_distances(std::f64::INFINITY, 0.0).is_err());
        assert!(odom.set_physical_distances(0.0, std::f64::NAN).is_err());
    }
}
