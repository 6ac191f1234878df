//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the closed loop lateral control simulation
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    // ---- TIMING ----
    /// Number of cycles to run
    pub num_cycles: u64,

    /// Rate the simulation and controller are stepped at.
    ///
    /// Units: Hz
    pub rate_hz: f64,

    // ---- VEHICLE MOTION ----
    /// Speed the vehicle accelerates up to.
    ///
    /// Units: meters/second
    pub target_speed_ms: f64,

    /// Acceleration from standstill up to the target speed.
    ///
    /// Units: meters/second^2
    pub accel_mss: f64,

    // ---- PLANNER ----
    /// Amplitude of the sinusoidal steering angle demand.
    ///
    /// Units: degrees
    pub ref_amplitude_deg: f64,

    /// Period of the sinusoidal steering angle demand.
    ///
    /// Units: seconds
    pub ref_period_s: f64,

    /// Angle offset estimate reported by the planner.
    ///
    /// Units: degrees
    pub angle_offset_deg: f64,

    // ---- STEERING PLANT ----
    /// Time constant of the first order steering response.
    ///
    /// Units: seconds
    pub plant_time_constant_s: f64,

    /// Steady state steering angle reached for a unit command.
    ///
    /// Units: degrees
    pub plant_cmd_gain_deg: f64,

    /// Maximum steering rate the actuator can achieve, above which the
    /// vehicle reports the steering as rate limited.
    ///
    /// Units: degrees/second
    pub plant_max_rate_degs: f64,

    // ---- ENGAGEMENT ----
    /// Time at which lateral control is engaged.
    ///
    /// Units: seconds
    pub engage_s: f64,

    /// Window in which the driver overrides the steering, as `[start, end)`.
    ///
    /// Units: seconds
    pub override_window_s: Option<[f64; 2]>,
}
