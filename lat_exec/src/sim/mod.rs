//! # Simulation module
//!
//! A closed loop bench for lateral control. The vehicle accelerates from
//! standstill up to a target speed while the planner demands a sinusoidal
//! steering angle, and a first order plant responds to the steering command.
//! The driver can be made to override the steering for a window of time.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod plant;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use plant::SteerPlant;

use serde::Serialize;
use std::f64::consts::TAU;

use crate::lat_ctrl::{LatPidState, OutputData};
use comms_if::{car::CarState, plan::LateralPlan};
use util::time::rate_to_period_s;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated vehicle and planner.
pub struct Sim {
    params: Params,

    /// Number of cycles run
    num_cycles: u64,

    /// Current speed.
    ///
    /// Units: meters/second
    v_ego_ms: f64,

    plant: SteerPlant,
}

/// One row of the simulation archive.
#[derive(Debug, Serialize)]
pub struct SimRecord {
    pub cycle: u64,
    pub time_s: f64,
    pub v_ego_ms: f64,
    pub steering_pressed: bool,
    pub steering_rate_limited: bool,
    pub angle_steers_des_deg: f64,
    pub steer_cmd: f64,

    // Diagnostic state
    pub steering_angle_deg: f64,
    pub steering_rate_degs: f64,
    pub active: bool,
    pub p: f64,
    pub i: f64,
    pub f: f64,
    pub output: f64,
    pub saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sim {
    pub fn new(params: Params) -> Self {
        let plant = SteerPlant::new(
            params.plant_time_constant_s,
            params.plant_cmd_gain_deg,
            params.plant_max_rate_degs,
        );

        Self {
            params,
            num_cycles: 0,
            v_ego_ms: 0.0,
            plant,
        }
    }

    /// Elapsed simulation time.
    ///
    /// Units: seconds
    pub fn time_s(&self) -> f64 {
        self.num_cycles as f64 / self.params.rate_hz
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// True once every cycle has been run
    pub fn finished(&self) -> bool {
        self.num_cycles >= self.params.num_cycles
    }

    /// True if lateral control should be engaged this cycle
    pub fn active(&self) -> bool {
        self.time_s() >= self.params.engage_s
    }

    /// True if the driver is overriding the steering this cycle
    pub fn steering_pressed(&self) -> bool {
        match self.params.override_window_s {
            Some([start, end]) => {
                let t = self.time_s();
                t >= start && t < end
            }
            None => false,
        }
    }

    /// The vehicle state measured this cycle
    pub fn car_state(&self) -> CarState {
        CarState {
            v_ego_ms: self.v_ego_ms,
            steering_angle_deg: self.plant.angle_deg,
            steering_rate_degs: self.plant.rate_degs,
            steering_pressed: self.steering_pressed(),
            steering_rate_limited: self.plant.rate_limited,
        }
    }

    /// The planner's output this cycle
    pub fn lat_plan(&self) -> LateralPlan {
        LateralPlan {
            steering_angle_deg: self.params.ref_amplitude_deg
                * (TAU * self.time_s() / self.params.ref_period_s).sin(),
            angle_offset_deg: self.params.angle_offset_deg,
        }
    }

    /// Apply the steering command and advance the simulation by one cycle.
    ///
    /// While the driver overrides the steering the plant holds its angle.
    pub fn step(&mut self, steer_cmd: f64) {
        let dt_s = rate_to_period_s(self.params.rate_hz);

        if self.steering_pressed() {
            self.plant.rate_degs = 0.0;
            self.plant.rate_limited = false;
        } else {
            self.plant.step(steer_cmd, dt_s);
        }

        self.v_ego_ms =
            (self.v_ego_ms + self.params.accel_mss * dt_s).min(self.params.target_speed_ms);

        self.num_cycles += 1;
    }
}

impl SimRecord {
    pub fn new(
        cycle: u64,
        time_s: f64,
        car_state: &CarState,
        output: &OutputData,
        pid_state: &LatPidState,
    ) -> Self {
        Self {
            cycle,
            time_s,
            v_ego_ms: car_state.v_ego_ms,
            steering_pressed: car_state.steering_pressed,
            steering_rate_limited: car_state.steering_rate_limited,
            angle_steers_des_deg: output.angle_steers_des_deg,
            steer_cmd: output.steer_cmd,
            steering_angle_deg: pid_state.steering_angle_deg,
            steering_rate_degs: pid_state.steering_rate_degs,
            active: pid_state.active,
            p: pid_state.p,
            i: pid_state.i,
            f: pid_state.f,
            output: pid_state.output,
            saturated: pid_state.saturated,
        }
    }
}
