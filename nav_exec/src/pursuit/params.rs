//! Pursuit path parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::PathError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default arc length between sampled path points.
pub const DEFAULT_SAMPLE_STEP_M: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters controlling path generation and tracking.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PathParams {
    /// Minimum turning radius of the Dubins segments.
    ///
    /// Units: meters
    pub turning_radius_m: f64,

    /// Radius within which the lookahead target is chosen.
    ///
    /// Units: meters
    pub lookahead_m: f64,

    /// Arc length between sampled points.
    ///
    /// Units: meters
    #[serde(default = "default_sample_step")]
    pub sample_step_m: f64,

    /// Length of the straight final approach, the lookahead distance if not given.
    ///
    /// Units: meters
    #[serde(default)]
    pub landing_strip_m: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathParams {
    pub fn validate(&self) -> Result<(), PathError> {
        positive("turning_radius_m", self.turning_radius_m)?;
        positive("lookahead_m", self.lookahead_m)?;
        positive("sample_step_m", self.sample_step_m)?;

        if let Some(l) = self.landing_strip_m {
            if !(l.is_finite() && l >= 0.0) {
                return Err(PathError::InvalidParam("landing_strip_m", l));
            }
        }

        Ok(())
    }

    /// The landing strip length to use.
    pub fn landing_strip(&self) -> f64 {
        self.landing_strip_m.unwrap_or(self.lookahead_m)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), PathError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PathError::InvalidParam(name, value))
    }
}

fn default_sample_step() -> f64 {
    DEFAULT_SAMPLE_STEP_M
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let p: PathParams = util::params::from_str(
            r#"
            turning_radius_m = 0.3
            lookahead_m = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(p.sample_step_m, DEFAULT_SAMPLE_STEP_M);
        assert_eq!(p.landing_strip(), 0.2);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let good = PathParams {
            turning_radius_m: 0.3,
            lookahead_m: 0.2,
            sample_step_m: 0.01,
            landing_strip_m: Some(0.0),
        };
        assert!(good.validate().is_ok());

        let mut p = good.clone();
        p.turning_radius_m = 0.0;
        assert!(p.validate().is_err());

        let mut p = good.clone();
        p.lookahead_m = -0.2;
        assert!(p.validate().is_err());

        let mut p = good.clone();
        p.sample_step_m = std::f64::NAN;
        assert!(p.validate().is_err());

        let mut p = good;
        p.landing_strip_m = Some(-1.0);
        assert!(p.validate().is_err());
    }
}
