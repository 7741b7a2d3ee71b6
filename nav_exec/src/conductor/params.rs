//! Conductor parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::ConductorError;
use crate::pursuit::PathParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pursuit conductor.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ConductorParams {
    /// Period between conductor steps, used as the PID time step.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// Path generation and tracking parameters.
    pub path: PathParams,

    /// Controller acting on the distance to go.
    pub forward: AxisParams,

    /// Controller acting on the steering angle.
    pub turning: AxisParams,
}

/// Parameters for one controlled axis.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AxisParams {
    #[serde(flatten)]
    pub pid: PidParams,

    /// Output saturation.
    ///
    /// Units: volts
    pub max_voltage_v: f64,

    /// Largest increase in output magnitude allowed per step, 0 to disable slew limiting.
    ///
    /// Units: volts
    pub slew_step_v: f64,
}

/// PID gains and settling behaviour.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// The integral only accumulates while the error magnitude is below this. 0 means always.
    #[serde(default)]
    pub integral_zone: f64,

    /// Error magnitude below which the controller counts as settling.
    pub settle_error: f64,

    /// How long the error must stay below `settle_error` before the controller is settled.
    ///
    /// Units: seconds
    pub settle_time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ConductorParams {
    pub fn validate(&self) -> Result<(), ConductorError> {
        if !(self.step_period_s.is_finite() && self.step_period_s > 0.0) {
            return Err(ConductorError::InvalidParam("step_period_s", self.step_period_s));
        }

        self.path.validate()?;
        self.forward.validate()?;
        self.turning.validate()
    }
}

impl AxisParams {
    pub fn validate(&self) -> Result<(), ConductorError> {
        self.pid.validate()?;

        if !(self.max_voltage_v.is_finite() && self.max_voltage_v > 0.0) {
            return Err(ConductorError::InvalidParam("max_voltage_v", self.max_voltage_v));
        }
        non_negative("slew_step_v", self.slew_step_v)
    }
}

impl PidParams {
    pub fn validate(&self) -> Result<(), ConductorError> {
        for &(name, gain) in &[("k_p", self.k_p), ("k_i", self.k_i), ("k_d", self.k_d)] {
            if !gain.is_finite() {
                return Err(ConductorError::InvalidParam(name, gain));
            }
        }

        non_negative("integral_zone", self.integral_zone)?;
        non_negative("settle_error", self.settle_error)?;
        non_negative("settle_time_s", self.settle_time_s)
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConductorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConductorError::InvalidParam(name, value))
    }
}
