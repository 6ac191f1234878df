//! # Lateral control module
//!
//! Lateral control computes the steering actuator command which drives the
//! measured steering angle towards the angle demanded by the lateral planner.
//!
//! Each cycle the controller either:
//!
//!  - Runs closed loop control through a speed scheduled PI controller, with
//!    a feedforward term that depends on how the vehicle's steering actuator
//!    is commanded (angle or torque), or
//!  - If the controller is not active or the vehicle is moving too slowly,
//!    outputs a zero command and resets the PI controller so that no integral
//!    is carried into the next active period.
//!
//! The gains can be overridden at runtime through a `TuningSource`, which is
//! polled every `TUNE_PERIOD_CYCLES` cycles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod helpers;
mod state;
pub mod tuning;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use helpers::*;
pub use state::*;
pub use tuning::{FileTuningSource, NoTuning, StaticTuning, TuningPayload, TuningSource};

use crate::pi_ctrl::PiCtrlError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speed below which the controller is inhibited.
///
/// Units: meters/second
pub const MIN_ACTIVE_SPEED_MS: f64 = 0.3;

/// Speed above which output saturation is counted.
///
/// Units: meters/second
pub const SAT_CHECK_MIN_SPEED_MS: f64 = 10.0;

/// Number of cycles between polls of the tuning source.
pub const TUNE_PERIOD_CYCLES: u32 = 300;

/// Output limit used until the first active cycle sets the speed dependent
/// limit.
pub const INIT_OUTPUT_LIMIT: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building or retuning LatCtrl.
#[derive(Debug, thiserror::Error)]
pub enum LatCtrlError {
    #[error("Invalid controller gains: {0}")]
    InvalidGains(#[from] PiCtrlError),

    #[error("Invalid steer max table: {0}")]
    InvalidSteerMax(#[source] PiCtrlError),

    #[error("Deadzone must be non-negative and finite, found {0}")]
    InvalidDeadzone(f64),
}
