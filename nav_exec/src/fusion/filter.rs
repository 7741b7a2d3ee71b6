//! # Vision smoothing
//!
//! A bounded history smoother and predictor for the vision poses. Each channel keeps the last few
//! timestamped samples, and predicts the value at a given time by extrapolating from the mean of
//! the history along the average velocity across it. There is no covariance or gain, the window
//! length alone sets the trade between lag and noise.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use crate::pose::Pose2D;
use util::maths::{ang_dist, safe_div};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rolling average plus linear extrapolation of a single scalar.
#[derive(Debug, Clone)]
pub struct RollingPredictor {
    window: usize,
    history: VecDeque<(f64, f64)>,
}

/// A rolling predictor for each component of a planar pose.
///
/// Yaw is unwrapped before it enters the history so the average isn't broken by the jump at
/// +/- pi.
#[derive(Debug, Clone)]
pub struct PoseFilter {
    x: RollingPredictor,
    y: RollingPredictor,
    yaw: RollingPredictor,

    last_yaw: Option<f64>,
    unwrapped_yaw: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RollingPredictor {
    /// Create a predictor holding at most `window` samples (at least one).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Add a sample taken at time `t_s`, dropping the oldest if the history is full.
    pub fn push(&mut self, t_s: f64, value: f64) {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back((t_s, value));
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Mean time and value of the history.
    pub fn mean(&self) -> Option<(f64, f64)> {
        if self.history.is_empty() {
            return None;
        }

        let n = self.history.len() as f64;
        let (st, sv) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(st, sv), (t, v)| (st + t, sv + v));

        Some((st / n, sv / n))
    }

    /// Average rate of change across the history, zero if it spans no time.
    pub fn velocity(&self) -> f64 {
        match (self.history.front(), self.history.back()) {
            (Some((t0, v0)), Some((t1, v1))) => safe_div(v1 - v0, t1 - t0, 0.0),
            _ => 0.0,
        }
    }

    /// Predict the value at time `t_s`.
    pub fn predict(&self, t_s: f64) -> Option<f64> {
        let (mean_t, mean_v) = self.mean()?;

        Some(mean_v + self.velocity() * (t_s - mean_t))
    }
}

impl PoseFilter {
    pub fn new(window: usize) -> Self {
        Self {
            x: RollingPredictor::new(window),
            y: RollingPredictor::new(window),
            yaw: RollingPredictor::new(window),
            last_yaw: None,
            unwrapped_yaw: 0.0,
        }
    }

    pub fn push(&mut self, t_s: f64, pose: &Pose2D) {
        self.unwrapped_yaw = match self.last_yaw {
            Some(last) => self.unwrapped_yaw + ang_dist(last, pose.yaw),
            None => pose.yaw,
        };
        self.last_yaw = Some(pose.yaw);

        self.x.push(t_s, pose.x);
        self.y.push(t_s, pose.y);
        self.yaw.push(t_s, self.unwrapped_yaw);
    }

    /// Predict the pose at time `t_s`, `None` if no pose has been pushed.
    pub fn predict(&self, t_s: f64) -> Option<Pose2D> {
        Some(Pose2D::new(
            self.x.predict(t_s)?,
            self.y.predict(t_s)?,
            self.yaw.predict(t_s)?,
        ))
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.yaw.clear();
        self.last_yaw = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_empty() {
        let p = RollingPredictor::new(4);
        assert!(p.is_empty());
        assert_eq!(p.predict(1.0), None);
        assert_eq!(p.velocity(), 0.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let mut p = RollingPredictor::new(5);
        for i in 0..5 {
            let t = i as f64 * 0.1;
            p.push(t, 2.0 + 3.0 * t);
        }

        // Mean sits at t = 0.2, a linear signal is recovered exactly
        assert!((p.velocity() - 3.0).abs() < EPS);
        assert!((p.predict(0.4).unwrap() - 3.2).abs() < EPS);
        assert!((p.predict(0.6).unwrap() - 3.8).abs() < EPS);
    }

    #[test]
    fn test_window_bounded() {
        let mut p = RollingPredictor::new(3);
        for i in 0..10 {
            p.push(i as f64, 100.0);
        }
        p.push(10.0, 0.0);
        assert_eq!(p.len(), 3);

        // Only the last three samples remain
        let (t, v) = p.mean().unwrap();
        assert!((t - 9.0).abs() < EPS);
        assert!((v - 200.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_smooths_noise() {
        let mut p = RollingPredictor::new(4);
        for (i, v) in [1.1, 0.9, 1.1, 0.9].iter().enumerate() {
            p.push(i as f64, *v);
        }
        let (_, mean) = p.mean().unwrap();
        assert!((mean - 1.0).abs() < EPS);
    }

    #[test]
    fn test_same_time_samples() {
        let mut p = RollingPredictor::new(3);
        p.push(1.0, 1.0);
        p.push(1.0, 3.0);
        assert_eq!(p.velocity(), 0.0);
        assert!((p.predict(5.0).unwrap() - 2.0).abs() < EPS);
    }

    #[test]
    fn test_pose_filter_yaw_wrap() {
        let mut f = PoseFilter::new(2);
        f.push(0.0, &Pose2D::new(0.0, 0.0, PI - 0.1));
        f.push(0.0, &Pose2D::new(0.0, 0.0, -PI + 0.1));

        // Averaging across the wrap gives pi, not zero
        let p = f.predict(0.0).unwrap();
        assert!(ang_dist(p.yaw, PI).abs() < EPS);
    }
}
