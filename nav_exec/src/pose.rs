//! # Pose algebra
//!
//! Poses live on the field plane with x to the right and y forwards, both in meters. Yaw is
//! counter-clockwise positive and measured from the +y (forward) axis, so a pose with zero yaw
//! faces straight up the field and its heading direction is the unit vector `(-sin yaw, cos yaw)`.
//!
//! A pose doubles as a rigid transform: composing `a` with `b` applies `b`, expressed in `a`'s
//! local right/forward frame, on top of `a`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use util::maths::{ang_dist, norm_angle};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Confidence at or above which a fused pose is considered to be tracking.
pub const CONFIDENCE_TRACKING: f64 = 0.3;

/// Confidence at or above which a fused pose is considered good.
pub const CONFIDENCE_GOOD: f64 = 0.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and heading on the field plane.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// Units: meters, right positive
    pub x: f64,

    /// Units: meters, forward positive
    pub y: f64,

    /// Units: radians, counter-clockwise positive, in (-pi, pi]
    pub yaw: f64,
}

/// The authoritative robot pose produced by fusion.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,

    /// Reliability of the estimate in [0, 1], 0 meaning there is no estimate at all.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2D {
    /// Create a new pose, normalising the yaw.
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self {
            x,
            y,
            yaw: norm_angle(yaw),
        }
    }

    /// The pose of the origin.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Unit vector pointing along the pose's heading.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(-self.yaw.sin(), self.yaw.cos())
    }

    /// The heading measured anticlockwise from the +x axis, as used by standard trigonometry.
    pub fn math_heading(&self) -> f64 {
        self.yaw + std::f64::consts::FRAC_PI_2
    }

    /// Returns true if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.yaw == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.yaw.is_finite()
    }

    /// Euclidian distance between the positions of two poses.
    pub fn dist(&self, other: &Pose2D) -> f64 {
        (other.position() - self.position()).norm()
    }

    /// Apply `local`, expressed in this pose's frame, to this pose.
    pub fn compose(&self, local: &Pose2D) -> Pose2D {
        let p = self.position() + Rotation2::new(self.yaw) * local.position();

        Pose2D::new(p[0], p[1], self.yaw + local.yaw)
    }

    /// Express a pose given in this pose's local frame in the world frame.
    ///
    /// This is exactly [`Pose2D::compose`].
    pub fn to_world_space(&self, local: &Pose2D) -> Pose2D {
        self.compose(local)
    }

    /// Express a world frame pose in this pose's local frame.
    pub fn to_object_space(&self, world: &Pose2D) -> Pose2D {
        let p = Rotation2::new(-self.yaw) * (world.position() - self.position());

        Pose2D::new(p[0], p[1], ang_dist(self.yaw, world.yaw))
    }

    /// The transform which undoes this one, `a.compose(&a.inverse())` is the origin.
    pub fn inverse(&self) -> Pose2D {
        self.to_object_space(&Pose2D::zero())
    }

    /// The transform taking this pose to `other`, such that `self.compose(&delta) == other`.
    pub fn delta(&self, other: &Pose2D) -> Pose2D {
        self.to_object_space(other)
    }
}

impl FusedPose {
    /// The planar part of the pose.
    pub fn pose2d(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.yaw)
    }

    /// Replace the planar part of the pose, leaving height, attitude and confidence untouched.
    pub fn set_pose2d(&mut self, pose: &Pose2D) {
        self.x = pose.x;
        self.y = pose.y;
        self.yaw = pose.yaw;
    }

    pub fn has_estimate(&self) -> bool {
        self.confidence > 0.0
    }

    pub fn is_tracking(&self) -> bool {
        self.confidence >= CONFIDENCE_TRACKING
    }

    pub fn is_good(&self) -> bool {
        self.confidence >= CONFIDENCE_GOOD
    }
}

impl From<Pose2D> for FusedPose {
    fn from(p: Pose2D) -> Self {
        Self {
            x: p.x,
            y: p.y,
            yaw: p.yaw,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn poses() -> Vec<Pose2D> {
        let mut v = Vec::new();
        for &x in &[-3.5, 0.0, 1.25] {
            for &y in &[-2.0, 0.0, 4.75] {
                for &yaw in &[-3.0, -FRAC_PI_2, 0.0, 0.3, 2.9, PI] {
                    v.push(Pose2D::new(x, y, yaw));
                }
            }
        }
        v
    }

    fn assert_pose_eq(a: &Pose2D, b: &Pose2D) {
        assert!((a.x - b.x).abs() < EPS, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < EPS, "{:?} != {:?}", a, b);
        assert!(ang_dist(a.yaw, b.yaw).abs() < EPS, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_new_normalises() {
        let p = Pose2D::new(0.0, 0.0, 3.0 * PI);
        assert!((p.yaw - PI).abs() < EPS);
        assert_eq!(Pose2D::new(0.0, 0.0, -PI).yaw, PI);
    }

    #[test]
    fn test_forward() {
        let f = Pose2D::new(0.0, 0.0, 0.0).forward();
        assert!(f[0].abs() < EPS && (f[1] - 1.0).abs() < EPS);

        // Quarter turn anticlockwise faces -x
        let f = Pose2D::new(0.0, 0.0, FRAC_PI_2).forward();
        assert!((f[0] + 1.0).abs() < EPS && f[1].abs() < EPS);
    }

    #[test]
    fn test_compose() {
        // Moving forward one meter while facing -x
        let a = Pose2D::new(1.0, 2.0, FRAC_PI_2);
        let b = Pose2D::new(0.0, 1.0, 0.0);
        assert_pose_eq(&a.compose(&b), &Pose2D::new(0.0, 2.0, FRAC_PI_2));

        // Moving right while facing -x goes up the field
        let b = Pose2D::new(1.0, 0.0, 0.5);
        assert_pose_eq(&a.compose(&b), &Pose2D::new(1.0, 3.0, FRAC_PI_2 + 0.5));
    }

    #[test]
    fn test_round_trip() {
        for a in poses() {
            for b in poses() {
                let rt = a.to_world_space(&a.to_object_space(&b));
                assert_pose_eq(&rt, &b);
            }
        }
    }

    #[test]
    fn test_inverse() {
        for a in poses() {
            assert_pose_eq(&a.compose(&a.inverse()), &Pose2D::zero());
            assert_pose_eq(&a.inverse().compose(&a), &Pose2D::zero());
            assert_pose_eq(&a.inverse().inverse(), &a);
        }
    }

    #[test]
    fn test_associative() {
        let a = Pose2D::new(1.0, -2.0, 0.7);
        let b = Pose2D::new(-0.5, 3.0, -2.1);
        let c = Pose2D::new(2.0, 0.25, 2.8);
        assert_pose_eq(&a.compose(&b).compose(&c), &a.compose(&b.compose(&c)));

        // But not commutative
        assert!(a.compose(&b).dist(&b.compose(&a)) > 0.1);
    }

    #[test]
    fn test_delta() {
        let a = Pose2D::new(1.0, -2.0, 0.7);
        let b = Pose2D::new(-0.5, 3.0, -2.1);
        assert_pose_eq(&a.compose(&a.delta(&b)), &b);
    }

    #[test]
    fn test_fused_confidence() {
        let mut p = FusedPose::from(Pose2D::new(1.0, 2.0, 0.1));
        assert!(!p.has_estimate());
        p.confidence = 0.3;
        assert!(p.is_tracking() && !p.is_good());
        p.confidence = 0.5;
        assert!(p.is_good());
        assert_pose_eq(&p.pose2d(), &Pose2D::new(1.0, 2.0, 0.1));
    }
}
