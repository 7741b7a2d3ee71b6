//! Implementations for the conductor state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};

// Internal
use super::{
    ConductorError, ConductorParams, ConductorReport, PidController, PursuitOutput, SlewLimiter,
};
use crate::{
    pose::Pose2D,
    pursuit::{PursuitEstimate, PursuitPath, Waypoint},
};
use util::{maths::ang_dist, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pursuit conductor.
#[derive(Debug, Clone, Default)]
pub struct PursuitConductor {
    params: ConductorParams,

    /// The path being followed, kept after completion so it can be inspected.
    path: Option<PursuitPath>,

    /// Heading to turn to in turn mode.
    target_yaw: f64,

    forward_pid: PidController,
    turn_pid: PidController,

    forward_slew: SlewLimiter,
    turn_slew: SlewLimiter,

    enabled: bool,
    is_turn: bool,

    last_estimate: PursuitEstimate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for PursuitConductor {
    /// Path to the conductor parameter file.
    type InitData = &'static str;
    type InitError = ConductorError;

    type InputData = Pose2D;
    type OutputData = PursuitOutput;
    type StatusReport = ConductorReport;
    type ProcError = ConductorError;

    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let params: ConductorParams =
            params::load(init_data).map_err(ConductorError::ParamLoadError)?;

        *self = Self::new(params)?;

        info!("Conductor initialised");

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input_data.is_finite() {
            return Err(ConductorError::NonFinitePose(*input_data));
        }

        let output = self.step(input_data);

        Ok((output, self.report()))
    }
}

impl PursuitConductor {
    pub fn new(params: ConductorParams) -> Result<Self, ConductorError> {
        params.validate()?;

        Ok(Self {
            forward_pid: PidController::new(params.forward.pid.clone(), params.step_period_s),
            turn_pid: PidController::new(params.turning.pid.clone(), params.step_period_s),
            forward_slew: SlewLimiter::new(params.forward.slew_step_v),
            turn_slew: SlewLimiter::new(params.turning.slew_step_v),
            params,
            ..Default::default()
        })
    }

    /// Build a path through the waypoints and start following it.
    ///
    /// If the waypoints are fine but no Dubins path joins them the (invalid) path is still
    /// loaded and the conductor enabled, so the next step reports an invalid output and stops.
    pub fn generate_path(
        &mut self,
        waypoints: &[Waypoint],
        timeout_s: f64,
    ) -> Result<(), ConductorError> {
        check_timeout(timeout_s)?;

        let path = PursuitPath::new(waypoints, self.params.path.clone())?;
        let solvable = path.is_valid();

        self.path = Some(path);
        self.is_turn = false;
        self.start(timeout_s);

        if !solvable {
            warn!("Loaded an unsolvable path through {} waypoints", waypoints.len());
            return Err(ConductorError::UnsolvablePath);
        }

        info!(
            "Following a {:.3} m path through {} waypoints",
            self.path.as_ref().map(|p| p.length()).unwrap_or(0.0),
            waypoints.len()
        );

        Ok(())
    }

    /// Start turning on the spot to the given yaw.
    pub fn generate_turn(&mut self, target_yaw: f64, timeout_s: f64) -> Result<(), ConductorError> {
        if !target_yaw.is_finite() {
            return Err(ConductorError::NonFiniteTarget(target_yaw));
        }
        check_timeout(timeout_s)?;

        self.target_yaw = target_yaw;
        self.is_turn = true;
        self.start(timeout_s);

        info!("Turning to {:.3} rad", target_yaw);

        Ok(())
    }

    /// Stop the current motion, taking effect on the next step.
    pub fn disable(&mut self) {
        if self.enabled {
            info!("Conductor disabled");
        }
        self.enabled = false;
    }

    /// Compute the drive and turn powers for the robot at `current`.
    pub fn step(&mut self, current: &Pose2D) -> PursuitOutput {
        if !self.enabled {
            return PursuitOutput::complete(self.last_estimate);
        }

        let estimate = if self.is_turn {
            let error = ang_dist(current.yaw, self.target_yaw);
            PursuitEstimate {
                is_valid: current.is_finite(),
                steering_rad: error,
                distance_m: 0.0,
                is_past_point: true,
                terminal_heading_error_rad: error,
                suggest_point_turn: false,
                target_index: None,
            }
        } else {
            match self.path.as_mut() {
                Some(p) => p.calculate_pursuit_estimate(current, true),
                None => PursuitEstimate::invalid(),
            }
        };
        self.last_estimate = estimate;

        if !estimate.is_valid {
            warn!("Invalid pursuit estimate, stopping");
            self.enabled = false;
            self.forward_slew.reset();
            self.turn_slew.reset();
            return PursuitOutput::invalid(estimate);
        }

        let mut drive = self
            .forward_slew
            .limit(self.forward_pid.update(estimate.distance_m));
        let mut steering = estimate.steering_rad;

        // Close enough, just line up with the final heading
        if self.forward_pid.is_settling() {
            drive = 0.0;
            self.forward_pid.reset_integral();
            self.forward_slew.reset();
            steering = estimate.terminal_heading_error_rad;
        }

        let mut turn = self.turn_slew.limit(self.turn_pid.update(steering));
        if self.turn_pid.is_settling() {
            turn = 0.0;
            self.turn_pid.reset_integral();
        }

        let max_drive = self.params.forward.max_voltage_v;
        let max_turn = self.params.turning.max_voltage_v;
        drive = drive.max(-max_drive).min(max_drive);
        turn = turn.max(-max_turn).min(max_turn);

        if self.forward_pid.is_settled() && self.turn_pid.is_settled() {
            info!("Motion complete");
            self.enabled = false;
            self.forward_slew.reset();
            self.turn_slew.reset();
            return PursuitOutput::complete(estimate);
        }

        // Heading can't be called settled while the robot is still travelling
        if self.turn_pid.is_settling() && !self.forward_pid.is_settling() {
            self.turn_pid.reset_settle_timer();
        }

        trace!("Conductor output: drive {:.3} V, turn {:.3} V", drive, turn);

        PursuitOutput {
            is_valid: true,
            is_complete: false,
            drive_power_v: drive,
            turn_power_v: turn,
            estimate,
        }
    }

    pub fn report(&self) -> ConductorReport {
        ConductorReport {
            enabled: self.enabled,
            is_turn: self.is_turn,
            forward_settled: self.forward_pid.is_settled(),
            turn_settled: self.turn_pid.is_settled(),
            target_index: self.last_estimate.target_index,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_turn(&self) -> bool {
        self.is_turn
    }

    pub fn path(&self) -> Option<&PursuitPath> {
        self.path.as_ref()
    }

    pub fn params(&self) -> &ConductorParams {
        &self.params
    }

    fn start(&mut self, timeout_s: f64) {
        self.forward_pid.reset(timeout_s);
        self.turn_pid.reset(timeout_s);
        self.forward_slew.reset();
        self.turn_slew.reset();
        self.last_estimate = PursuitEstimate::invalid();
        self.enabled = true;

        debug!("Conductor enabled with a {:.1} s timeout", timeout_s);
    }
}

fn check_timeout(timeout_s: f64) -> Result<(), ConductorError> {
    if timeout_s.is_finite() && timeout_s >= 0.0 {
        Ok(())
    } else {
        Err(ConductorError::InvalidParam("timeout_s", timeout_s))
    }
}
