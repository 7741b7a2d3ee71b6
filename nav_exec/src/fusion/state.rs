//! Implementations for the fusion engine state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};

// Internal
use super::{FuseOutcome, FusionError, FusionMode, FusionParams, FusionReport, PoseFilter};
use crate::{
    odom::{OdomFrame, OdomParams, SensorFrame, Velocity},
    pose::{FusedPose, Pose2D},
};
use comms_if::eqpt::vision::VisionPose;
use util::{maths::ang_dist, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The fusion engine.
#[derive(Debug, Clone, Default)]
pub struct OdomFusion {
    params: FusionParams,

    frame: OdomFrame,

    pose: FusedPose,

    accepting_fuses: bool,
    approving_frames: bool,

    filter: Option<PoseFilter>,

    /// Time advanced by each step, used to timestamp vision poses for smoothing.
    time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for OdomFusion {
    /// Paths to the odometry and fusion parameter files.
    type InitData = (&'static str, &'static str);
    type InitError = FusionError;

    type InputData = SensorFrame;
    type OutputData = FusedPose;
    type StatusReport = FusionReport;
    type ProcError = FusionError;

    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let odom_params: OdomParams =
            params::load(init_data.0).map_err(FusionError::ParamLoadError)?;
        let fusion_params: FusionParams =
            params::load(init_data.1).map_err(FusionError::ParamLoadError)?;

        *self = Self::new(fusion_params, OdomFrame::from_params(&odom_params)?)?;

        info!("Fusion initialised in {:?} mode", self.params.mode);

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let pose = self.step(input_data)?;

        let report = FusionReport {
            approving_frames: self.approving_frames,
            accepting_fuses: self.accepting_fuses,
            velocity: self.frame.velocity_vector(),
        };

        Ok((pose, report))
    }
}

impl OdomFusion {
    /// Create a new engine around the given odometry stack.
    pub fn new(params: FusionParams, frame: OdomFrame) -> Result<Self, FusionError> {
        params.validate()?;

        let filter = match params.vision_filter_window {
            0 => None,
            w => Some(PoseFilter::new(w)),
        };

        let mut pose = FusedPose::default();
        pose.set_pose2d(&frame.pose());

        Ok(Self {
            params,
            frame,
            pose,
            accepting_fuses: true,
            approving_frames: false,
            filter,
            time_s: 0.0,
        })
    }

    /// Advance the odometry stack with the latest sensor readings.
    ///
    /// Non-finite readings are rejected and leave the pose untouched. In vision only mode the
    /// odometry stack still consumes the readings but the pose is left to vision.
    pub fn step(&mut self, sensors: &SensorFrame) -> Result<FusedPose, FusionError> {
        if !sensors.is_finite() {
            return Err(FusionError::NonFiniteSensors(*sensors));
        }

        self.time_s += self.frame.step_period_s();
        self.frame.step(sensors);

        if self.params.mode != FusionMode::VisionOnly {
            self.pose.set_pose2d(&self.frame.pose());
            self.pose.pitch = sensors.pitch_rad;
            self.pose.roll = sensors.roll_rad;
        }

        trace!("Fused pose: {:?}", self.pose);

        Ok(self.pose)
    }

    /// Parse a vision record, move it from the camera onto the robot centre, and fuse it.
    pub fn on_vision_message(&mut self, payload: &str) -> Result<FuseOutcome, FusionError> {
        let fix = payload.parse::<VisionPose>()?.to_robot_axes();

        let camera = Pose2D::new(fix.x_m, fix.y_m, fix.yaw_rad);
        let robot = camera.compose(&self.params.camera_offset.inverse());

        self.on_vision(FusedPose {
            x: robot.x,
            y: robot.y,
            z: fix.z_m,
            pitch: fix.pitch_rad,
            yaw: robot.yaw,
            roll: fix.roll_rad,
            confidence: fix.confidence,
        })
    }

    /// Fuse a vision pose expressed at the robot centre.
    pub fn on_vision(&mut self, vision: FusedPose) -> Result<FuseOutcome, FusionError> {
        if !(vision.pose2d().is_finite()
            && vision.z.is_finite()
            && vision.pitch.is_finite()
            && vision.roll.is_finite()
            && vision.confidence.is_finite())
        {
            return Err(FusionError::NonFiniteVision(vision));
        }

        if self.params.mode == FusionMode::WheelOdomOnly || !self.accepting_fuses {
            return Ok(FuseOutcome::Ignored);
        }

        if vision.confidence < self.params.min_confidence_threshold {
            if self.approving_frames {
                debug!("Vision frames no longer approved");
            }
            trace!(
                "Rejected vision pose with confidence {:.3} (threshold {:.3})",
                vision.confidence,
                self.params.min_confidence_threshold
            );
            self.approving_frames = false;
            return Ok(FuseOutcome::Rejected);
        }

        if !self.approving_frames {
            debug!("Vision frames approved");
        }
        self.approving_frames = true;

        let target = self.smooth(vision.pose2d());

        if self.params.mode == FusionMode::VisionOnly {
            self.frame.tare(target.x, target.y, target.yaw);
            self.pose = vision;
            self.pose.set_pose2d(&target);
            return Ok(FuseOutcome::Accepted);
        }

        let corrected = self.bounded_shift(&target);
        self.frame.tare(corrected.x, corrected.y, corrected.yaw);

        self.pose.set_pose2d(&corrected);
        self.pose.z = vision.z;
        self.pose.confidence = vision.confidence;

        trace!("Vision correction applied, pose now {:?}", corrected);

        Ok(FuseOutcome::Accepted)
    }

    /// Redefine the pose, for example at the start of a run.
    pub fn set_pose(&mut self, x: f64, y: f64, yaw: f64) {
        self.frame.tare(x, y, yaw);
        self.pose.set_pose2d(&self.frame.pose());

        if let Some(f) = self.filter.as_mut() {
            f.clear();
        }
    }

    pub fn accept_fuses(&mut self) {
        self.accepting_fuses = true;
    }

    pub fn reject_fuses(&mut self) {
        self.accepting_fuses = false;
    }

    pub fn is_accepting_fuses(&self) -> bool {
        self.accepting_fuses
    }

    /// Whether the most recent vision pose passed the confidence gate.
    pub fn approving_frames(&self) -> bool {
        self.approving_frames
    }

    pub fn pose(&self) -> FusedPose {
        self.pose
    }

    pub fn mode(&self) -> FusionMode {
        self.params.mode
    }

    /// Change mode. The odometry stack is tared to the current pose so the new mode carries on
    /// from it.
    pub fn set_mode(&mut self, mode: FusionMode) {
        if mode != self.params.mode {
            info!("Fusion mode changed from {:?} to {:?}", self.params.mode, mode);
            self.params.mode = mode;

            let pose = self.pose.pose2d();
            self.frame.tare(pose.x, pose.y, pose.yaw);
        }
    }

    pub fn velocity_vector(&mut self) -> Velocity {
        self.frame.velocity_vector()
    }

    /// Pass the vision pose through the smoothing filter, if there is one.
    fn smooth(&mut self, pose: Pose2D) -> Pose2D {
        let t = self.time_s;
        match self.filter.as_mut() {
            Some(f) => {
                f.push(t, &pose);
                f.predict(t).unwrap_or(pose)
            }
            None => pose,
        }
    }

    /// Move from the current pose toward the target, bounded per call in gradual mode.
    fn bounded_shift(&self, target: &Pose2D) -> Pose2D {
        let current = self.pose.pose2d();
        let gradual = self.params.mode == FusionMode::Gradual;

        let dist = current.dist(target);
        let position = if gradual && dist > self.params.max_shift_per_tick_m {
            let scale = self.params.max_shift_per_tick_m / dist;
            current.position() + (target.position() - current.position()) * scale
        } else {
            target.position()
        };

        let d_yaw = ang_dist(current.yaw, target.yaw);
        let yaw = if gradual && d_yaw.abs() > self.params.max_shift_per_tick_rad {
            current.yaw + self.params.max_shift_per_tick_rad * d_yaw.signum()
        } else {
            target.yaw
        };

        Pose2D::new(position[0], position[1], yaw)
    }
}
