//! # Lateral plan
//!
//! Output of the lateral planner consumed by the lateral controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The steering demand produced by the lateral planner for this cycle.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct LateralPlan {
    /// Desired steering angle.
    ///
    /// Units: degrees
    pub steering_angle_deg: f64,

    /// Estimated offset between the measured steering angle and the true straight-ahead angle.
    ///
    /// Units: degrees
    pub angle_offset_deg: f64,
}
