//! Speed scheduled gains

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::PiCtrlError;
use util::maths::interp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A gain which varies with vehicle speed.
///
/// The gain is given by a table of values at speed breakpoints, and is
/// linearly interpolated between them. Outside of the breakpoints the first or
/// last value is used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainSchedule {
    /// Speed breakpoints, strictly increasing.
    bp: Vec<f64>,

    /// Gain at each breakpoint.
    v: Vec<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GainSchedule {
    /// Create a new schedule from breakpoints and values.
    ///
    /// The tables must be non-empty, the same length, contain only finite
    /// numbers, and the breakpoints must be strictly increasing.
    pub fn new(bp: Vec<f64>, v: Vec<f64>) -> Result<Self, PiCtrlError> {
        if bp.is_empty() {
            return Err(PiCtrlError::EmptySchedule);
        }

        if bp.len() != v.len() {
            return Err(PiCtrlError::ScheduleLengthMismatch(bp.len(), v.len()));
        }

        if let Some(x) = bp.iter().chain(v.iter()).find(|x| !x.is_finite()) {
            return Err(PiCtrlError::NonFiniteGain(*x));
        }

        if let Some(i) = bp.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PiCtrlError::NonIncreasingBreakpoints(i + 1));
        }

        Ok(Self { bp, v })
    }

    /// Create a schedule with the same gain at every speed.
    pub fn constant(gain: f64) -> Result<Self, PiCtrlError> {
        Self::new(vec![0.0], vec![gain])
    }

    /// Get the gain at the given speed.
    pub fn eval(&self, speed: f64) -> f64 {
        // Tables were validated at construction so interp can't fail
        interp(speed, &self.bp, &self.v).unwrap_or(0.0)
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.bp
    }

    pub fn values(&self) -> &[f64] {
        &self.v
    }
}
