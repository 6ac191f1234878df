//! Lateral control simulation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the tuning source and the lateral controller
//!     - Main loop:
//!         - Acquire the simulated vehicle state and lateral plan
//!         - Lateral control processing
//!         - Archive the controller's diagnostic state
//!         - Step the simulation with the steering command
//!     - Log a summary of the run

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::car::CarParams;
use lat_lib::{
    lat_ctrl::{FileTuningSource, LatCtrlPid, NoTuning, TuningSource},
    sim::{Params as SimParams, Sim, SimRecord},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter, LogConfig},
    session::Session,
    time::rate_to_period_s,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Path of the controller's archive, relative to the session's archive root.
const PID_STATE_ARCH_PATH: &str = "lat_ctrl/pid_state.csv";

/// Modules which log every control cycle.
const CYCLE_LOG_TARGETS: &[&str] = &["lat_lib::pi_ctrl", "lat_lib::lat_ctrl"];

/// Tracking error above which a cycle is counted against the summary.
///
/// Units: degrees
const TRACKING_ERROR_WARN_DEG: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed loop lateral control simulation
#[derive(Debug, StructOpt)]
#[structopt(name = "lat_exec")]
struct Opt {
    /// Path to a JSON live tuning file, polled while the simulation runs
    #[structopt(long, parse(from_os_str))]
    tune: Option<PathBuf>,

    /// Vehicle parameter file, relative to the params directory
    #[structopt(long, default_value = "car.toml")]
    car_params: String,

    /// Simulation parameter file, relative to the params directory
    #[structopt(long, default_value = "sim.toml")]
    sim_params: String,

    /// Override the number of cycles to run
    #[structopt(long)]
    cycles: Option<u64>,

    /// Pace the simulation in real time rather than as fast as possible
    #[structopt(long)]
    realtime: bool,

    /// Log at debug level to the console and trace level to the log file
    #[structopt(short, long)]
    verbose: bool,
}

/// Statistics gathered over the run
#[derive(Debug, Default)]
struct Summary {
    num_active_cycles: u64,
    num_saturated_cycles: u64,
    num_large_error_cycles: u64,
    max_abs_error_deg: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("lat_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, per-cycle traces only go to the log file
    let log_config = if opt.verbose {
        LogConfig {
            console_level: LevelFilter::Debug,
            file_level: LevelFilter::Trace,
            cycle_targets: CYCLE_LOG_TARGETS,
        }
    } else {
        LogConfig {
            console_level: LevelFilter::Info,
            file_level: LevelFilter::Debug,
            cycle_targets: CYCLE_LOG_TARGETS,
        }
    };
    logger_init(log_config, &session).wrap_err("Failed to initialise logging")?;

    info!("Lateral Control Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let car_params: CarParams =
        util::params::load(&opt.car_params).wrap_err("Could not load car params")?;

    let mut sim_params: SimParams =
        util::params::load(&opt.sim_params).wrap_err("Could not load sim params")?;

    if let Some(cycles) = opt.cycles {
        sim_params.num_cycles = cycles;
    }

    if !(sim_params.rate_hz.is_finite() && sim_params.rate_hz > 0.0) {
        return Err(eyre!(
            "Simulation rate must be positive, found {} Hz",
            sim_params.rate_hz
        ));
    }

    info!("Exec parameters loaded");

    // ---- RUN ----

    match opt.tune {
        Some(ref path) => {
            info!("Live tuning will be read from {:?}", path);
            run(
                &session,
                &car_params,
                sim_params,
                FileTuningSource::new(path),
                opt.realtime,
            )
        }
        None => {
            info!("No tuning file provided, live tuning disabled");
            run(&session, &car_params, sim_params, NoTuning, opt.realtime)
        }
    }
}

/// Run the closed loop simulation with the given tuning source.
fn run<T: TuningSource>(
    session: &Session,
    car_params: &CarParams,
    sim_params: SimParams,
    tuning: T,
    realtime: bool,
) -> Result<(), Report> {
    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let cycle_period = Duration::from_secs_f64(rate_to_period_s(sim_params.rate_hz));

    let mut lat_ctrl = LatCtrlPid::with_rate(car_params, tuning, sim_params.rate_hz)
        .wrap_err("Failed to initialise LatCtrl")?;
    info!("LatCtrl init complete");

    let mut archiver = Archiver::from_path(session, PID_STATE_ARCH_PATH)
        .wrap_err("Failed to initialise the LatCtrl archive")?;
    info!("Archiving LatCtrl state to {:?}", archiver.path());

    let mut sim = Sim::new(sim_params);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut summary = Summary::default();

    while !sim.finished() {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- INPUT ACQUISITION ----

        let car_state = sim.car_state();
        let lat_plan = sim.lat_plan();

        // ---- LATERAL CONTROL ----

        let (output, pid_state) = lat_ctrl.update(sim.active(), &car_state, car_params, &lat_plan);

        if pid_state.active {
            let abs_error_deg =
                (output.angle_steers_des_deg - car_state.steering_angle_deg).abs();

            summary.num_active_cycles += 1;
            summary.max_abs_error_deg = summary.max_abs_error_deg.max(abs_error_deg);

            if abs_error_deg > TRACKING_ERROR_WARN_DEG {
                summary.num_large_error_cycles += 1;
            }
            if pid_state.saturated {
                summary.num_saturated_cycles += 1;
            }
        }

        // ---- ARCHIVING ----

        archiver
            .serialise(&SimRecord::new(
                sim.num_cycles(),
                sim.time_s(),
                &car_state,
                &output,
                &pid_state,
            ))
            .wrap_err("Failed to archive LatCtrl state")?;

        // ---- SIMULATION ----

        sim.step(output.steer_cmd);

        // ---- CYCLE MANAGEMENT ----

        if realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                ),
            }
        }
    }

    archiver.flush().wrap_err("Failed to flush the LatCtrl archive")?;

    // ---- SHUTDOWN ----

    info!(
        "Ran {} cycles ({:.2} s), {} active",
        sim.num_cycles(),
        sim.time_s(),
        summary.num_active_cycles
    );
    info!(
        "Max tracking error: {:.3} deg, {} cycles above {:.1} deg",
        summary.max_abs_error_deg, summary.num_large_error_cycles, TRACKING_ERROR_WARN_DEG
    );
    if summary.num_saturated_cycles > 0 {
        warn!("Output saturated for {} cycles", summary.num_saturated_cycles);
    } else {
        info!("Output never saturated");
    }

    info!("End of execution");

    Ok(())
}
