//! # Lateral control library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the lateral control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Lateral control module - computes the steering command which tracks the planner's desired
/// steering angle
pub mod lat_ctrl;

/// PI controller - speed scheduled proportional-integral controller with anti-windup
pub mod pi_ctrl;

/// Simulation - closed loop vehicle and planner model used to exercise lateral control
pub mod sim;
