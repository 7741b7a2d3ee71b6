//! # Pursuit path

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

// Internal
use super::{
    dubins::{DubinsConfig, DubinsPath},
    PathError, PathParams,
};
use crate::pose::Pose2D;
use util::maths::{ang_dist, chebyshev_dist, norm_angle};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance on arc length comparisons against the sample step.
const ARC_EPS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point the path must pass through, optionally with a heading.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Heading at the waypoint. If not given the robot heads toward the next waypoint (or, for
    /// the final waypoint, continues in the direction it came from).
    ///
    /// Units: radians, counter-clockwise from +y
    #[serde(default)]
    pub yaw: Option<f64>,
}

/// A marker on the sampled path bounding the tracking search window.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    /// Index into the path points.
    pub index: usize,

    /// Set once the tracking query reaches this checkpoint, never cleared.
    pub visited: bool,

    /// True only for the final checkpoint.
    pub is_last: bool,
}

/// Result of the tracking query.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct PursuitEstimate {
    /// If false none of the other fields are meaningful and the robot must not be driven.
    pub is_valid: bool,

    /// Angle to turn through to face the target, counter-clockwise positive.
    ///
    /// Units: radians
    pub steering_rad: f64,

    /// Distance to the target plus the remaining path length beyond it. Negative if the robot
    /// has overshot the end of the path.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// The robot has driven past the end of the path.
    pub is_past_point: bool,

    /// Heading error to the final pose of the path.
    ///
    /// Units: radians
    pub terminal_heading_error_rad: f64,

    /// The target is behind the robot, turning on the spot is preferable to driving.
    pub suggest_point_turn: bool,

    /// Index of the target point in the path.
    pub target_index: Option<usize>,
}

/// A path built from Dubins segments, sampled for tracking.
#[derive(Debug, Clone, Serialize)]
pub struct PursuitPath {
    params: PathParams,

    is_valid: bool,

    segments: Vec<DubinsPath>,

    points: Vec<Pose2D>,

    /// Cumulative arc length at each point.
    arc_lengths: Vec<f64>,

    checkpoints: Vec<Checkpoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, yaw: None }
    }

    pub fn with_yaw(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw: Some(yaw) }
    }
}

impl PursuitEstimate {
    /// An estimate telling the caller to stop.
    pub fn invalid() -> Self {
        Self::default()
    }
}

impl PursuitPath {
    /// Build a path through the waypoints.
    ///
    /// Bad parameters or fewer than two waypoints are an error. If any pair of waypoints has no
    /// Dubins solution the path is still returned, but marked invalid so every query on it
    /// reports an invalid estimate.
    pub fn new(waypoints: &[Waypoint], params: PathParams) -> Result<Self, PathError> {
        params.validate()?;

        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints(waypoints.len()));
        }

        let mut poses = resolve_headings(waypoints);

        // Pull the final approach back along the final heading so the robot arrives straight
        let strip = params.landing_strip();
        if strip > 0.0 {
            let last = poses[poses.len() - 1];
            let approach = last.compose(&Pose2D::new(0.0, -strip, 0.0));
            poses.insert(poses.len() - 1, approach);
        }

        let mut path = Self {
            params,
            is_valid: true,
            segments: Vec::with_capacity(poses.len() - 1),
            points: Vec::new(),
            arc_lengths: Vec::new(),
            checkpoints: Vec::new(),
        };

        for (i, pair) in poses.windows(2).enumerate() {
            match DubinsPath::shortest(
                to_config(&pair[0]),
                to_config(&pair[1]),
                path.params.turning_radius_m,
            ) {
                Some(d) => path.segments.push(d),
                None => {
                    warn!(
                        "No Dubins path between {:?} and {:?} (segment {}), path is invalid",
                        pair[0], pair[1], i
                    );
                    path.is_valid = false;
                    path.segments.clear();
                    return Ok(path);
                }
            }
        }

        path.sample();

        debug!(
            "Built path of {} segments, {:.3} m long, {} points, {} checkpoints",
            path.segments.len(),
            path.length(),
            path.points.len(),
            path.checkpoints.len()
        );

        Ok(path)
    }

    /// Find the lookahead target for the robot at `current`.
    ///
    /// The search is restricted to the points between the most recently visited checkpoint and
    /// the next unvisited one. If no point in that window lies within the lookahead distance the
    /// closest point in the window is used when `allow_closest_fallback` is set, otherwise the
    /// estimate is invalid.
    pub fn calculate_pursuit_estimate(
        &mut self,
        current: &Pose2D,
        allow_closest_fallback: bool,
    ) -> PursuitEstimate {
        if !self.is_valid || self.points.is_empty() || !current.is_finite() {
            return PursuitEstimate::invalid();
        }

        let last = self.points.len() - 1;

        let start = self
            .checkpoints
            .iter()
            .rev()
            .find(|c| c.visited)
            .map(|c| c.index)
            .unwrap_or(0);
        let end = self
            .checkpoints
            .iter()
            .find(|c| !c.visited && c.index >= start)
            .map(|c| c.index)
            .unwrap_or(last);

        let target = match self.find_lookahead(current, start, end) {
            Some(i) => i,
            None if allow_closest_fallback => self.find_closest(current, start, end),
            None => {
                trace!("No point within lookahead in window [{}, {}]", start, end);
                return PursuitEstimate::invalid();
            }
        };

        self.visit_checkpoints(target);

        let target_pose = self.points[target];
        let to_target = target_pose.dist(current);
        let remaining = self.length() - self.arc_lengths[target];

        let mut steering = if to_target > std::f64::EPSILON {
            norm_angle(
                (target_pose.y - current.y).atan2(target_pose.x - current.x)
                    - current.math_heading(),
            )
        } else {
            ang_dist(current.yaw, target_pose.yaw)
        };
        let mut distance = to_target + remaining;

        let terminal_heading_error = ang_dist(current.yaw, self.points[last].yaw);

        // Overshot the end while facing the right way, so back up rather than turn around
        let mut is_past_point = false;
        if remaining <= self.params.sample_step_m + ARC_EPS
            && terminal_heading_error.abs() < FRAC_PI_2
            && steering.abs() > FRAC_PI_2
        {
            is_past_point = true;
            steering = norm_angle(steering + PI);
            distance = -distance;
        }

        let estimate = PursuitEstimate {
            is_valid: true,
            steering_rad: steering,
            distance_m: distance,
            is_past_point,
            terminal_heading_error_rad: terminal_heading_error,
            suggest_point_turn: steering.abs() > FRAC_PI_2,
            target_index: Some(target),
        };

        trace!("Pursuit estimate: {:?}", estimate);

        estimate
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn segments(&self) -> &[DubinsPath] {
        &self.segments
    }

    pub fn points(&self) -> &[Pose2D] {
        &self.points
    }

    pub fn arc_lengths(&self) -> &[f64] {
        &self.arc_lengths
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Total arc length of the sampled path.
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// The final pose of the path, `None` if the path is invalid.
    pub fn end_pose(&self) -> Option<Pose2D> {
        self.points.last().copied()
    }

    /// Sample the segments into points and place the checkpoints.
    fn sample(&mut self) {
        let step = self.params.sample_step_m;
        let mut arc = 0.0;

        if let Some(first) = self.segments.first() {
            self.points.push(from_config(&first.sample(0.0)));
            self.arc_lengths.push(0.0);
        }

        for seg in self.segments.iter() {
            let start_idx = self.points.len() - 1;
            let len = seg.length();
            let n = ((len / step) - ARC_EPS).ceil().max(0.0) as usize;

            for k in 1..=n {
                let s = if k == n { len } else { k as f64 * step };
                self.points.push(from_config(&seg.sample(s)));
                self.arc_lengths.push(arc + s);
            }
            arc += len;

            let end_idx = self.points.len() - 1;
            for &index in &[start_idx + (end_idx - start_idx) / 2, end_idx] {
                let is_new = match self.checkpoints.last() {
                    Some(c) => c.index != index,
                    None => true,
                };
                if is_new {
                    self.checkpoints.push(Checkpoint {
                        index,
                        visited: false,
                        is_last: false,
                    });
                }
            }
        }

        if let Some(c) = self.checkpoints.last_mut() {
            c.is_last = true;
        }
    }

    /// Scan backward through the window for the first point within the lookahead distance.
    fn find_lookahead(&self, current: &Pose2D, start: usize, end: usize) -> Option<usize> {
        let lookahead = self.params.lookahead_m;
        let robot = (current.x, current.y);

        (start..=end).rev().find(|&i| {
            let p = &self.points[i];

            chebyshev_dist((p.x, p.y), robot) <= lookahead && p.dist(current) <= lookahead
        })
    }

    fn find_closest(&self, current: &Pose2D, start: usize, end: usize) -> usize {
        (start..=end)
            .fold((start, std::f64::INFINITY), |(best, best_d), i| {
                let d = self.points[i].dist(current);
                if d < best_d {
                    (i, d)
                } else {
                    (best, best_d)
                }
            })
            .0
    }

    /// Mark every checkpoint within the lookahead arc length of the target as visited.
    fn visit_checkpoints(&mut self, target: usize) {
        let lookahead = self.params.lookahead_m;
        let target_arc = self.arc_lengths[target];

        for c in self.checkpoints.iter_mut().filter(|c| !c.visited) {
            if (self.arc_lengths[c.index] - target_arc).abs() <= lookahead {
                c.visited = true;
                debug!(
                    "Checkpoint at index {} visited{}",
                    c.index,
                    if c.is_last { " (last)" } else { "" }
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Fill in missing waypoint headings.
fn resolve_headings(waypoints: &[Waypoint]) -> Vec<Pose2D> {
    let n = waypoints.len();

    waypoints
        .iter()
        .enumerate()
        .map(|(i, wp)| {
            let yaw = match wp.yaw {
                Some(yaw) => yaw,
                None if i + 1 < n => bearing(wp, &waypoints[i + 1]),
                None => bearing(&waypoints[i - 1], wp),
            };
            Pose2D::new(wp.x, wp.y, yaw)
        })
        .collect()
}

/// Yaw of the direction from `a` to `b`.
fn bearing(a: &Waypoint, b: &Waypoint) -> f64 {
    norm_angle((b.y - a.y).atan2(b.x - a.x) - FRAC_PI_2)
}

fn to_config(pose: &Pose2D) -> DubinsConfig {
    DubinsConfig {
        x: pose.x,
        y: pose.y,
        heading: pose.math_heading(),
    }
}

fn from_config(config: &DubinsConfig) -> Pose2D {
    Pose2D::new(config.x, config.y, config.heading - FRAC_PI_2)
}
