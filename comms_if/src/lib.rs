//! # Communications interface crate.
//!
//! Provides the interface structures exchanged between the lateral controller
//! and its neighbours in the control pipeline: the vehicle state estimator,
//! the vehicle interface and the lateral planner.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Vehicle state and vehicle parameter definitions
pub mod car;

/// Lateral planner output definitions
pub mod plan;
