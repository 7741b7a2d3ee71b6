//! # PID controller
//!
//! A fixed time step PID with settle tracking. The controller counts how long the error has
//! stayed inside the settle band and how long it has been running, which the conductor uses to
//! decide when a motion is done.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::PidParams;
use util::time::seconds_to_millis;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The controller is settling once the error has been in the band for this fraction of the
/// settle time.
const SETTLING_FRACTION: f64 = 0.2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Clone, Default, Serialize)]
pub struct PidController {
    #[serde(skip)]
    params: PidParams,

    /// Time step between updates.
    ///
    /// Units: seconds
    dt_s: f64,

    /// The controller is settled once it has run for longer than this, 0 for no timeout.
    ///
    /// Units: seconds
    timeout_s: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,

    time_running_ms: f64,
    time_settled_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller updated every `dt_s` seconds.
    pub fn new(params: PidParams, dt_s: f64) -> Self {
        Self {
            params,
            dt_s,
            ..Default::default()
        }
    }

    /// Get the output of the controller for the given error, advancing time by one step.
    pub fn update(&mut self, error: f64) -> f64 {
        let dt_ms = seconds_to_millis(self.dt_s);
        self.time_running_ms += dt_ms;

        if error.abs() < self.params.settle_error {
            self.time_settled_ms += dt_ms;
        } else {
            self.time_settled_ms = 0.0;
        }

        // Stop the integral winding through the setpoint
        if let Some(prev) = self.prev_error {
            if prev.signum() != error.signum() {
                self.integral = 0.0;
            }
        }

        if self.params.integral_zone == 0.0 || error.abs() < self.params.integral_zone {
            self.integral += error * self.dt_s;
        }

        let deriv = match self.prev_error {
            Some(prev) if self.dt_s > 0.0 => (error - prev) / self.dt_s,
            _ => 0.0,
        };

        self.prev_error = Some(error);

        self.params.k_p * error + self.params.k_i * self.integral + self.params.k_d * deriv
    }

    /// Clear all accumulated state and start a new motion with the given timeout.
    pub fn reset(&mut self, timeout_s: f64) {
        self.timeout_s = timeout_s;
        self.prev_error = None;
        self.integral = 0.0;
        self.time_running_ms = 0.0;
        self.time_settled_ms = 0.0;
    }

    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn reset_settle_timer(&mut self) {
        self.time_settled_ms = 0.0;
    }

    /// True once the error has stayed in the settle band for the settle time, or the timeout
    /// has run out.
    pub fn is_settled(&self) -> bool {
        self.time_settled_ms > seconds_to_millis(self.params.settle_time_s)
            || (self.timeout_s > 0.0 && self.time_running_ms > seconds_to_millis(self.timeout_s))
    }

    /// True once settled, or once the error has been in the settle band for a fraction of the
    /// settle time.
    pub fn is_settling(&self) -> bool {
        self.is_settled()
            || self.time_settled_ms
                > seconds_to_millis(self.params.settle_time_s) * SETTLING_FRACTION
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}
