//! # PI controller module
//!
//! This module provides the proportional-integral controller used as the
//! numerical core of lateral control. Its gains are scheduled on vehicle
//! speed, and it provides:
//!
//!  - A dead-band on the error,
//!  - A feedforward term,
//!  - Conditional integration anti-windup, which only accepts a new integral
//!    value if it doesn't push the output further into the limit it's
//!    already against,
//!  - Saturation detection, which raises a flag once the output has been
//!    saturated for longer than a timeout.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controller;
mod gain_schedule;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use gain_schedule::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default rate at which the controller is stepped.
///
/// Units: Hz
pub const DEFAULT_RATE_HZ: f64 = 100.0;

/// Magnitude of error below which a saturated output is not counted towards
/// the saturation timeout.
pub const SAT_ERROR_THRESHOLD: f64 = 0.1;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when building a PI controller.
#[derive(Debug, thiserror::Error)]
pub enum PiCtrlError {
    #[error("Gain schedule is empty")]
    EmptySchedule,

    #[error("Gain schedule has {0} breakpoints but {1} values")]
    ScheduleLengthMismatch(usize, usize),

    #[error("Gain schedule breakpoints must be strictly increasing (breakpoint {0} is not)")]
    NonIncreasingBreakpoints(usize),

    #[error("Expected a finite gain or breakpoint, found {0}")]
    NonFiniteGain(f64),

    #[error("Controller rate must be positive and finite, found {0} Hz")]
    InvalidRate(f64),

    #[error("Saturation time limit must be non-negative and finite, found {0} s")]
    InvalidSatLimit(f64),
}
