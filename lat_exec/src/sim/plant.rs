//! First order steering plant model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rate limited first order model of the steering actuator.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SteerPlant {
    /// Current steering angle.
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Current steering rate.
    ///
    /// Units: degrees/second
    pub rate_degs: f64,

    /// True if the last step was limited by the maximum rate
    pub rate_limited: bool,

    time_constant_s: f64,
    cmd_gain_deg: f64,
    max_rate_degs: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerPlant {
    pub fn new(time_constant_s: f64, cmd_gain_deg: f64, max_rate_degs: f64) -> Self {
        Self {
            time_constant_s,
            cmd_gain_deg,
            max_rate_degs,
            ..Default::default()
        }
    }

    /// Advance the plant by `dt_s` under the given command.
    pub fn step(&mut self, cmd: f64, dt_s: f64) {
        let target_deg = cmd * self.cmd_gain_deg;
        let rate_degs = (target_deg - self.angle_deg) / self.time_constant_s;

        self.rate_degs = clamp(rate_degs, -self.max_rate_degs, self.max_rate_degs);
        self.rate_limited = self.rate_degs != rate_degs;

        // Don't overshoot the target when the time step is large compared to
        // the time constant
        let step_deg = self.rate_degs * dt_s;
        if step_deg.abs() >= (target_deg - self.angle_deg).abs() {
            self.angle_deg = target_deg;
        } else {
            self.angle_deg += step_deg;
        }
    }
}
