//! PI controller implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{GainSchedule, PiCtrlError, SAT_ERROR_THRESHOLD};
use util::{
    maths::{apply_deadzone, clamp},
    time::rate_to_period_s,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A speed scheduled PI controller with feedforward.
#[derive(Debug, Clone, Serialize)]
pub struct PiController {
    /// Proportional gain schedule
    k_p: GainSchedule,

    /// Integral gain schedule
    k_i: GainSchedule,

    /// Feedforward gain
    k_f: f64,

    /// Upper output limit
    pub pos_limit: f64,

    /// Lower output limit
    pub neg_limit: f64,

    /// Time the output may be saturated for before `saturated` is raised.
    ///
    /// Units: seconds
    sat_limit_s: f64,

    /// Rate the controller is stepped at.
    ///
    /// Units: Hz
    rate_hz: f64,

    /// Proportional term from the last step
    p: f64,

    /// Integral accumulation
    i: f64,

    /// Feedforward term from the last step
    f: f64,

    /// Time spent saturated, counts up while saturated and down otherwise.
    ///
    /// Units: seconds
    sat_count_s: f64,

    /// True if the output has been saturated for longer than `sat_limit_s`
    saturated: bool,

    /// The last (clamped) output
    control: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PiController {
    /// Create a new controller.
    pub fn new(
        k_p: GainSchedule,
        k_i: GainSchedule,
        k_f: f64,
        pos_limit: f64,
        neg_limit: f64,
        sat_limit_s: f64,
        rate_hz: f64,
    ) -> Result<Self, PiCtrlError> {
        if !k_f.is_finite() {
            return Err(PiCtrlError::NonFiniteGain(k_f));
        }
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(PiCtrlError::InvalidRate(rate_hz));
        }
        if !(sat_limit_s.is_finite() && sat_limit_s >= 0.0) {
            return Err(PiCtrlError::InvalidSatLimit(sat_limit_s));
        }

        Ok(Self {
            k_p,
            k_i,
            k_f,
            pos_limit,
            neg_limit,
            sat_limit_s,
            rate_hz,
            p: 0.0,
            i: 0.0,
            f: 0.0,
            sat_count_s: 0.0,
            saturated: false,
            control: 0.0,
        })
    }

    /// Clear the integrator, the saturation state and the last output terms.
    pub fn reset(&mut self) {
        self.p = 0.0;
        self.i = 0.0;
        self.f = 0.0;
        self.sat_count_s = 0.0;
        self.saturated = false;
        self.control = 0.0;
    }

    /// Step the controller, returning the output clamped between
    /// `neg_limit` and `pos_limit`.
    ///
    /// - `check_saturation`: if false time spent saturated is not counted.
    /// - `steer_override`: the operator is overriding the output, the
    ///   integrator is held.
    /// - `speed`: the speed the gains are scheduled on.
    /// - `deadzone`: errors of a smaller magnitude are treated as zero.
    pub fn step(
        &mut self,
        setpoint: f64,
        measurement: f64,
        check_saturation: bool,
        steer_override: bool,
        feedforward: f64,
        speed: f64,
        deadzone: f64,
    ) -> f64 {
        let error = apply_deadzone(setpoint - measurement, deadzone);

        self.p = error * self.k_p.eval(speed);
        self.f = feedforward * self.k_f;

        // The integrator is held while overridden, or once the output has
        // been saturated for longer than the limit.
        if !(steer_override || self.saturated) {
            let i = self.i + error * self.k_i.eval(speed) / self.rate_hz;
            let control = self.p + self.f + i;

            // Only accept the new integral if it doesn't drive the output
            // further into the limit it's against.
            if (error >= 0.0 && (control <= self.pos_limit || i < 0.0))
                || (error <= 0.0 && (control >= self.neg_limit || i > 0.0))
            {
                self.i = i;
            }
        }

        let control = self.p + self.f + self.i;

        self.saturated = self.update_saturation(control, check_saturation, error);
        self.control = clamp(control, self.neg_limit, self.pos_limit);

        trace!(
            "PI step: err {:.4}, p {:.4}, i {:.4}, f {:.4}, out {:.4}, sat {}",
            error,
            self.p,
            self.i,
            self.f,
            self.control,
            self.saturated
        );

        self.control
    }

    /// Update the saturation counter and return whether the saturation limit
    /// has been exceeded.
    fn update_saturation(&mut self, control: f64, check_saturation: bool, error: f64) -> bool {
        let dt_s = rate_to_period_s(self.rate_hz);
        let out_of_limits = control < self.neg_limit || control > self.pos_limit;

        if out_of_limits && check_saturation && error.abs() > SAT_ERROR_THRESHOLD {
            self.sat_count_s += dt_s;
        } else {
            self.sat_count_s -= dt_s;
        }

        self.sat_count_s = clamp(self.sat_count_s, 0.0, 1.0);

        self.sat_count_s > self.sat_limit_s
    }

    /// Proportional term from the last step
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Integral term
    pub fn i(&self) -> f64 {
        self.i
    }

    /// Feedforward term from the last step
    pub fn f(&self) -> f64 {
        self.f
    }

    /// True if the output has been saturated for longer than the limit
    pub fn saturated(&self) -> bool {
        self.saturated
    }

    /// The last output
    pub fn control(&self) -> f64 {
        self.control
    }

    pub fn k_p(&self) -> &GainSchedule {
        &self.k_p
    }

    pub fn k_i(&self) -> &GainSchedule {
        &self.k_i
    }

    pub fn k_f(&self) -> f64 {
        self.k_f
    }

    pub fn sat_limit_s(&self) -> f64 {
        self.sat_limit_s
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
}
