//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Start the simulated robot and its vision thread
//!     - Generate the path through the configured waypoints
//!     - Main loop, one cycle per control tick:
//!         - Sensor acquisition
//!         - Odometry and fusion processing
//!         - Conductor processing
//!         - Drive mix and actuation
//!     - Once the path (and the optional final turn) completes, save the pose history and exit
//!
//! # Modules
//!
//! All stateful modules (e.g. `conductor`) shall provide a public struct implementing the
//! `util::module::State` trait.
//!
//! # Arguments
//!
//! Pass `--trace-loop` to include per tick pursuit, fusion and conductor tracing in the log.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use comms_if::eqpt::drive::DriveDems;
use nav_lib::{
    conductor::{DriveActuator, DriveMix, DriveParams, PursuitConductor, SharedConductor},
    data_store::DataStore,
    fusion::{FusionHandle, FusionParams, OdomFusion},
    odom::OdomParams,
    pose::Pose2D,
    sched::{CycleStatus, CycleTimer, Node, Scheduler},
    shared::lock_or_recover,
    sim::{SimHandle, SimParams, SimRobot},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
    time::duration_to_seconds,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Number of cycles between pose history samples.
const HISTORY_DECIMATION: u128 = 10;

/// Execution stops after this long even if the motion hasn't completed.
const MAX_RUN_DURATION_S: f64 = 120.0;

/// Timeout on following the path.
const PATH_TIMEOUT_S: f64 = 60.0;

/// Timeout on the final turn.
const TURN_TIMEOUT_S: f64 = 10.0;

/// Execution stops after this many consecutive cycle overruns.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 500;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Navigation core against the simulated robot")]
struct Args {
    /// Include per tick pursuit, fusion and conductor tracing in the log
    #[structopt(long = "trace-loop")]
    trace_loop: bool,
}

/// One sample of the saved pose history.
#[derive(Serialize)]
struct PoseSample {
    time_s: f64,
    fused: Pose2D,
    truth: Pose2D,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let args = Args::from_args();

    let start_time = chrono::Utc::now();

    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, args.trace_loop, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Navigation Core Executable\n");
    info!("Started at {}", start_time.to_rfc3339());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let odom_params: OdomParams =
        util::params::load("odom.toml").wrap_err("Could not load odometry params")?;
    let fusion_params: FusionParams =
        util::params::load("fusion.toml").wrap_err("Could not load fusion params")?;
    let drive_params: DriveParams =
        util::params::load("drive.toml").wrap_err("Could not load drive params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut fusion = OdomFusion::default();
    fusion
        .init(("odom.toml", "fusion.toml"), &session)
        .wrap_err("Failed to initialise fusion")?;
    let fusion = FusionHandle::new(fusion);
    info!("Fusion init complete");

    let mut conductor = PursuitConductor::default();
    conductor
        .init("conductor.toml", &session)
        .wrap_err("Failed to initialise the conductor")?;
    let conductor: SharedConductor = Arc::new(Mutex::new(conductor));
    info!("Conductor init complete");

    let drive = DriveMix::new(drive_params).wrap_err("Failed to initialise the drive mix")?;
    info!("Drive mix init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE SIMULATION ----

    let sim = SimHandle::new(SimRobot::new(
        sim_params.clone(),
        &odom_params,
        fusion_params.camera_offset,
    ));

    let start = sim_params.start;
    fusion.set_pose(start.x, start.y, start.yaw);
    info!("Simulated robot starting at {:?}", start);

    let vision_stop = Arc::new(AtomicBool::new(false));
    let vision_thread = if sim_params.vision_period_cycles > 0 {
        let period =
            Duration::from_secs_f64(CYCLE_PERIOD_S * sim_params.vision_period_cycles as f64);
        let sim = sim.clone();
        let fusion = fusion.clone();
        let stop = vision_stop.clone();

        info!("Starting vision thread with a {:?} period", period);

        Some(thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(period);

                match fusion.on_vision_message(&sim.vision_message()) {
                    Ok(outcome) => trace!("Vision pose {:?}", outcome),
                    Err(e) => warn!("Could not fuse vision pose: {}", e),
                }
            }
        }))
    } else {
        None
    };

    // ---- GENERATE PATH ----

    lock_or_recover(&conductor, "Conductor")
        .generate_path(&sim_params.waypoints, PATH_TIMEOUT_S)
        .wrap_err("Failed to generate the path")?;

    let path = lock_or_recover(&conductor, "Conductor").path().cloned();
    if let Some(path) = path {
        session.save("path.json", path);
    }

    let mut pending_turn = sim_params.final_turn_yaw;

    // ---- MAIN LOOP ----

    let mut sched = Scheduler::new();
    sched.add(Node::Fusion(fusion.clone()));
    sched.add(Node::Conductor(conductor.clone()));
    sched.add(Node::Drive(drive));

    let mut ds = DataStore::default();
    let mut sensors = sim.clone();
    let mut actuator = sim.clone();
    let mut history = Vec::new();

    let max_cycles = (MAX_RUN_DURATION_S / CYCLE_PERIOD_S) as u128;
    let mut timer = CycleTimer::new(Duration::from_secs_f64(CYCLE_PERIOD_S));

    info!("Begining main loop\n");

    loop {
        sched.run_cycle(&mut ds, &mut sensors, &mut actuator);

        if ds.num_cycles % HISTORY_DECIMATION == 0 {
            history.push(PoseSample {
                time_s: ds.cycle_time_s,
                fused: ds.pose.pose2d(),
                truth: sim.truth(),
            });
        }

        if !ds.pursuit.is_valid {
            error!("Conductor output is invalid, stopping");
            break;
        }

        if ds.pursuit.is_complete {
            match pending_turn.take() {
                Some(yaw) => {
                    info!("Path complete, turning to {:.3} rad", yaw);
                    lock_or_recover(&conductor, "Conductor")
                        .generate_turn(yaw, TURN_TIMEOUT_S)
                        .wrap_err("Failed to generate the final turn")?;
                }
                None => {
                    info!("Motion complete after {} cycles", ds.num_cycles);
                    break;
                }
            }
        }

        if ds.num_cycles >= max_cycles {
            warn!("Maximum run duration of {} s reached", MAX_RUN_DURATION_S);
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        match timer.wait() {
            CycleStatus::OnTime => ds.num_consec_cycle_overruns = 0,
            CycleStatus::Overrun(d) => {
                warn!("Cycle overran by {:.06} s", d.as_secs_f64());
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > MAX_CONSEC_CYCLE_OVERRUNS {
                    error!(
                        "More than {} consecutive cycle overruns, stopping",
                        MAX_CONSEC_CYCLE_OVERRUNS
                    );
                    break;
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    actuator.send_dems(&DriveDems::stop());

    let fused = fusion.pose().pose2d();
    let truth = sim.truth();
    info!("Final fused pose: {:?}", fused);
    info!("Final true pose:  {:?}", truth);
    info!("Position error: {:.4} m", fused.dist(&truth));

    session.save("pose_history.json", history);

    vision_stop.store(true, Ordering::Relaxed);
    if let Some(handle) = vision_thread {
        if handle.join().is_err() {
            warn!("Vision thread panicked before exiting");
        }
    }
    debug!("Vision thread exited");

    info!(
        "End of execution, ran for {:.2} s",
        duration_to_seconds(chrono::Utc::now() - start_time).unwrap_or(std::f64::NAN)
    );

    session.exit();

    Ok(())
}
