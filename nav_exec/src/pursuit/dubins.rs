//! # Dubins curves
//!
//! The shortest path between two oriented points for a vehicle with a minimum turning radius is
//! made of three segments, each either a left arc (L), a right arc (R) or a straight (S). Only six
//! words can be optimal: LSL, RSR, LSR, RSL, RLR and LRL. Each is solved in closed form in a
//! normalised frame where the start sits at the origin, the goal lies on the +x axis and the
//! turning radius is one, and the shortest feasible word is kept.
//!
//! This module works in the usual mathematical convention, with headings measured anticlockwise
//! from the +x axis. Callers using forward-is-+y poses convert at the boundary.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use ordered_float::NotNan;
use serde::Serialize;
use std::f64::consts::TAU;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angles within this of a full turn are taken as zero, so round-off doesn't add a loop.
const ANGLE_EPS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An oriented point, heading anticlockwise from +x.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DubinsConfig {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// A solved Dubins path.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct DubinsPath {
    start: DubinsConfig,
    radius: f64,
    word: DubinsWord,

    /// Normalised (radius one) segment lengths.
    params: [f64; 3],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SegmentType {
    Left,
    Straight,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum DubinsWord {
    Lsl,
    Rsr,
    Lsr,
    Rsl,
    Rlr,
    Lrl,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DubinsWord {
    pub const ALL: [DubinsWord; 6] = [
        DubinsWord::Lsl,
        DubinsWord::Rsr,
        DubinsWord::Lsr,
        DubinsWord::Rsl,
        DubinsWord::Rlr,
        DubinsWord::Lrl,
    ];

    pub fn segments(&self) -> [SegmentType; 3] {
        use SegmentType::*;

        match self {
            DubinsWord::Lsl => [Left, Straight, Left],
            DubinsWord::Rsr => [Right, Straight, Right],
            DubinsWord::Lsr => [Left, Straight, Right],
            DubinsWord::Rsl => [Right, Straight, Left],
            DubinsWord::Rlr => [Right, Left, Right],
            DubinsWord::Lrl => [Left, Right, Left],
        }
    }

    /// Solve this word for the normalised problem, returning the three segment lengths.
    fn solve(&self, p: &Intermediate) -> Option<[f64; 3]> {
        let Intermediate {
            alpha, beta, d, sa, sb, ca, cb, c_ab, d_sq,
        } = *p;

        match self {
            DubinsWord::Lsl => {
                let tmp0 = d + sa - sb;
                let p_sq = 2.0 + d_sq - 2.0 * c_ab + 2.0 * d * (sa - sb);
                if p_sq < 0.0 {
                    return None;
                }
                let tmp1 = (cb - ca).atan2(tmp0);
                Some([mod2pi(tmp1 - alpha), p_sq.sqrt(), mod2pi(beta - tmp1)])
            }
            DubinsWord::Rsr => {
                let tmp0 = d - sa + sb;
                let p_sq = 2.0 + d_sq - 2.0 * c_ab + 2.0 * d * (sb - sa);
                if p_sq < 0.0 {
                    return None;
                }
                let tmp1 = (ca - cb).atan2(tmp0);
                Some([mod2pi(alpha - tmp1), p_sq.sqrt(), mod2pi(tmp1 - beta)])
            }
            DubinsWord::Lsr => {
                let p_sq = -2.0 + d_sq + 2.0 * c_ab + 2.0 * d * (sa + sb);
                if p_sq < 0.0 {
                    return None;
                }
                let p = p_sq.sqrt();
                let tmp0 = (-ca - cb).atan2(d + sa + sb) - (-2.0f64).atan2(p);
                Some([mod2pi(tmp0 - alpha), p, mod2pi(tmp0 - beta)])
            }
            DubinsWord::Rsl => {
                let p_sq = -2.0 + d_sq + 2.0 * c_ab - 2.0 * d * (sa + sb);
                if p_sq < 0.0 {
                    return None;
                }
                let p = p_sq.sqrt();
                let tmp0 = (ca + cb).atan2(d - sa - sb) - (2.0f64).atan2(p);
                Some([mod2pi(alpha - tmp0), p, mod2pi(beta - tmp0)])
            }
            DubinsWord::Rlr => {
                let tmp0 = (6.0 - d_sq + 2.0 * c_ab + 2.0 * d * (sa - sb)) / 8.0;
                if tmp0.abs() > 1.0 {
                    return None;
                }
                let phi = (ca - cb).atan2(d - sa + sb);
                let p = mod2pi(TAU - tmp0.acos());
                let t = mod2pi(alpha - phi + mod2pi(p / 2.0));
                Some([t, p, mod2pi(alpha - beta - t + p)])
            }
            DubinsWord::Lrl => {
                let tmp0 = (6.0 - d_sq + 2.0 * c_ab + 2.0 * d * (sb - sa)) / 8.0;
                if tmp0.abs() > 1.0 {
                    return None;
                }
                let phi = (ca - cb).atan2(d + sa - sb);
                let p = mod2pi(TAU - tmp0.acos());
                let t = mod2pi(-alpha - phi + p / 2.0);
                Some([t, p, mod2pi(beta - alpha - t + p)])
            }
        }
    }
}

impl DubinsPath {
    /// Find the shortest Dubins path between two configurations.
    ///
    /// Returns `None` if no word is feasible, which only happens for non-finite input or a
    /// non-positive radius.
    pub fn shortest(start: DubinsConfig, end: DubinsConfig, radius: f64) -> Option<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return None;
        }

        let inter = Intermediate::new(&start, &end, radius)?;

        // Coincident configurations need no motion at all, rather than a full loop
        if inter.d == 0.0 && inter.alpha == inter.beta {
            return Some(Self {
                start,
                radius,
                word: DubinsWord::Lsl,
                params: [0.0; 3],
            });
        }

        DubinsWord::ALL
            .iter()
            .filter_map(|w| {
                let params = w.solve(&inter)?;
                let len = NotNan::new(params.iter().sum::<f64>()).ok()?;
                Some((len, *w, params))
            })
            .min_by_key(|(len, _, _)| *len)
            .map(|(_, word, params)| Self {
                start,
                radius,
                word,
                params,
            })
    }

    pub fn word(&self) -> DubinsWord {
        self.word
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Length of each segment in meters.
    pub fn segment_lengths(&self) -> [f64; 3] {
        [
            self.params[0] * self.radius,
            self.params[1] * self.radius,
            self.params[2] * self.radius,
        ]
    }

    /// Total length in meters.
    pub fn length(&self) -> f64 {
        self.params.iter().sum::<f64>() * self.radius
    }

    /// The configuration at arc length `s` meters along the path, clamped to the path.
    pub fn sample(&self, s: f64) -> DubinsConfig {
        let mut t = (s / self.radius).max(0.0).min(self.params.iter().sum());

        // Work in the normalised frame with the start at the origin
        let mut q = (0.0, 0.0, self.start.heading);
        let segments = self.word.segments();

        for i in 0..3 {
            let len = self.params[i];
            let step = t.min(len);
            q = segment(step, q, segments[i]);
            t -= step;

            if t <= 0.0 {
                break;
            }
        }

        DubinsConfig {
            x: q.0 * self.radius + self.start.x,
            y: q.1 * self.radius + self.start.y,
            heading: q.2,
        }
    }

    /// The final configuration of the path.
    pub fn end(&self) -> DubinsConfig {
        self.sample(self.length())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// Quantities shared by all six word solutions.
#[derive(Clone, Copy)]
struct Intermediate {
    alpha: f64,
    beta: f64,
    d: f64,
    sa: f64,
    sb: f64,
    ca: f64,
    cb: f64,
    c_ab: f64,
    d_sq: f64,
}

impl Intermediate {
    fn new(start: &DubinsConfig, end: &DubinsConfig, radius: f64) -> Option<Self> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let d = (dx * dx + dy * dy).sqrt() / radius;

        let theta = if d > 0.0 { mod2pi(dy.atan2(dx)) } else { 0.0 };
        let alpha = mod2pi(start.heading - theta);
        let beta = mod2pi(end.heading - theta);

        if !(d.is_finite() && alpha.is_finite() && beta.is_finite()) {
            return None;
        }

        Some(Self {
            alpha,
            beta,
            d,
            sa: alpha.sin(),
            sb: beta.sin(),
            ca: alpha.cos(),
            cb: beta.cos(),
            c_ab: (alpha - beta).cos(),
            d_sq: d * d,
        })
    }
}

/// Wrap an angle into [0, 2pi), snapping values a hair under a full turn to zero.
fn mod2pi(theta: f64) -> f64 {
    let r = util::maths::rem_euclid(theta, TAU);
    if TAU - r < ANGLE_EPS {
        0.0
    } else {
        r
    }
}

/// Advance a normalised configuration along a segment of normalised length `t`.
fn segment(t: f64, q: (f64, f64, f64), kind: SegmentType) -> (f64, f64, f64) {
    let (x, y, h) = q;
    match kind {
        SegmentType::Left => (
            x + (h + t).sin() - h.sin(),
            y - (h + t).cos() + h.cos(),
            h + t,
        ),
        SegmentType::Right => (
            x - (h - t).sin() + h.sin(),
            y + (h - t).cos() - h.cos(),
            h - t,
        ),
        SegmentType::Straight => (x + h.cos() * t, y + h.sin() * t, h),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-6;

    fn cfg(x: f64, y: f64, heading: f64) -> DubinsConfig {
        DubinsConfig { x, y, heading }
    }

    fn assert_reaches(path: &DubinsPath, goal: &DubinsConfig) {
        let end = path.end();
        assert!((end.x - goal.x).abs() < EPS, "{:?} vs {:?}", end, goal);
        assert!((end.y - goal.y).abs() < EPS, "{:?} vs {:?}", end, goal);
        assert!(
            util::maths::ang_dist(end.heading, goal.heading).abs() < EPS,
            "{:?} vs {:?}",
            end,
            goal
        );
    }

    #[test]
    fn test_straight() {
        let path = DubinsPath::shortest(cfg(0.0, 0.0, 0.0), cfg(4.0, 0.0, 0.0), 1.0).unwrap();
        assert!((path.length() - 4.0).abs() < EPS);
        assert_reaches(&path, &cfg(4.0, 0.0, 0.0));

        // Heading along +y in the forward-is-y convention
        let path =
            DubinsPath::shortest(cfg(0.0, 0.0, FRAC_PI_2), cfg(0.0, 1.8, FRAC_PI_2), 0.3).unwrap();
        assert!((path.length() - 1.8).abs() < EPS);
        assert_eq!(path.segment_lengths()[0], 0.0);
        assert_eq!(path.segment_lengths()[2], 0.0);
    }

    #[test]
    fn test_u_turn() {
        // Quarter turn left, one radius straight, quarter turn left
        let path = DubinsPath::shortest(cfg(0.0, 0.0, 0.0), cfg(0.0, 3.0, PI), 1.0).unwrap();
        assert_eq!(path.word(), DubinsWord::Lsl);
        assert!((path.length() - (PI + 1.0)).abs() < EPS);
        assert_reaches(&path, &cfg(0.0, 3.0, PI));

        let mid = path.sample(FRAC_PI_2 + 0.5);
        assert!((mid.x - 1.0).abs() < EPS);
        assert!((mid.y - 1.5).abs() < EPS);
    }

    #[test]
    fn test_all_reach_goal() {
        let starts = [cfg(0.0, 0.0, 0.0), cfg(1.0, -2.0, 2.5), cfg(-0.5, 0.3, -1.2)];
        let goals = [
            cfg(3.0, 1.0, FRAC_PI_2),
            cfg(0.2, 0.1, PI),
            cfg(-2.0, 4.0, -0.3),
            cfg(0.5, 0.0, 0.0),
        ];

        for s in starts.iter() {
            for g in goals.iter() {
                let path = DubinsPath::shortest(*s, *g, 0.4).unwrap();
                assert_reaches(&path, g);

                // No path is shorter than the straight line
                let straight = ((g.x - s.x).powi(2) + (g.y - s.y).powi(2)).sqrt();
                assert!(path.length() >= straight - EPS);
            }
        }
    }

    #[test]
    fn test_shortest_beats_each_word() {
        let s = cfg(0.0, 0.0, 0.3);
        let g = cfg(1.0, 1.5, -2.0);
        let path = DubinsPath::shortest(s, g, 0.5).unwrap();
        let inter = Intermediate::new(&s, &g, 0.5).unwrap();

        for w in DubinsWord::ALL.iter() {
            if let Some(p) = w.solve(&inter) {
                assert!(path.length() <= p.iter().sum::<f64>() * 0.5 + EPS);
            }
        }
    }

    #[test]
    fn test_coincident() {
        let path = DubinsPath::shortest(cfg(1.0, 1.0, 0.7), cfg(1.0, 1.0, 0.7), 0.3).unwrap();
        assert_eq!(path.length(), 0.0);
    }

    #[test]
    fn test_invalid() {
        assert!(DubinsPath::shortest(cfg(0.0, 0.0, 0.0), cfg(1.0, 0.0, 0.0), 0.0).is_none());
        assert!(
            DubinsPath::shortest(cfg(0.0, 0.0, 0.0), cfg(std::f64::NAN, 0.0, 0.0), 1.0).is_none()
        );
        assert!(
            DubinsPath::shortest(cfg(0.0, 0.0, std::f64::INFINITY), cfg(1.0, 0.0, 0.0), 1.0)
                .is_none()
        );
    }

    #[test]
    fn test_sample_clamped() {
        let path = DubinsPath::shortest(cfg(0.0, 0.0, 0.0), cfg(4.0, 0.0, 0.0), 1.0).unwrap();
        let before = path.sample(-1.0);
        let after = path.sample(10.0);
        assert!(before.x.abs() < EPS);
        assert!((after.x - 4.0).abs() < EPS);
        assert!((path.sample(1.5).x - 1.5).abs() < EPS);
    }
}
