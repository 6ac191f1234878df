//! # Vehicle interface
//!
//! Definitions of the live vehicle state provided by the state estimator each cycle, and the
//! vehicle parameters provided by the vehicle interface once per drive.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Live vehicle state, sampled once per control cycle.
///
/// Callers must guarantee the values are finite and that the speed is non-negative.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct CarState {
    /// Vehicle speed.
    ///
    /// Units: meters/second
    pub v_ego_ms: f64,

    /// Measured steering angle.
    ///
    /// Units: degrees
    pub steering_angle_deg: f64,

    /// Measured steering rate.
    ///
    /// Units: degrees/second
    pub steering_rate_degs: f64,

    /// True if the driver is applying torque to the steering wheel, overriding the controller.
    pub steering_pressed: bool,

    /// True if the steering actuator is currently rate limited by the vehicle.
    pub steering_rate_limited: bool,
}

/// Vehicle parameters, fixed for the duration of a drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarParams {
    /// How the steering actuator is commanded.
    pub steer_control_type: SteerControlType,

    /// Time the controller output may be saturated for before the saturation flag is raised.
    ///
    /// Units: seconds
    pub steer_limit_timer_s: f64,

    /// Speed breakpoints for the maximum steering command.
    ///
    /// Units: meters/second
    pub steer_max_bp: Vec<f64>,

    /// Maximum steering command at each of the `steer_max_bp` breakpoints.
    pub steer_max_v: Vec<f64>,

    /// Gains for the lateral PID controller.
    pub lateral_tuning: LatPidTuning,
}

/// Gain schedules for the lateral PID controller.
///
/// Each gain is given as a table of values at speed breakpoints, gains between breakpoints are
/// linearly interpolated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatPidTuning {
    /// Speed breakpoints of the proportional gain.
    ///
    /// Units: meters/second
    pub kp_bp: Vec<f64>,

    /// Proportional gain at each breakpoint.
    pub kp_v: Vec<f64>,

    /// Speed breakpoints of the integral gain.
    ///
    /// Units: meters/second
    pub ki_bp: Vec<f64>,

    /// Integral gain at each breakpoint.
    pub ki_v: Vec<f64>,

    /// Feedforward gain.
    pub kf: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The way in which a vehicle's steering actuator is commanded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteerControlType {
    /// The actuator is commanded with a steering angle.
    Angle,

    /// The actuator is commanded with a steering torque.
    Torque,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CarParams {
    fn default() -> Self {
        Self {
            steer_control_type: SteerControlType::Torque,
            steer_limit_timer_s: 0.8,
            steer_max_bp: vec![0.0],
            steer_max_v: vec![1.0],
            lateral_tuning: LatPidTuning::default(),
        }
    }
}

impl Default for LatPidTuning {
    fn default() -> Self {
        Self {
            kp_bp: vec![0.0],
            kp_v: vec![0.0],
            ki_bp: vec![0.0],
            ki_v: vec![0.0],
            kf: 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let params: CarParams = toml::from_str(
            r#"
            steer_control_type = "angle"
            steer_limit_timer_s = 1.0
            steer_max_bp = [0.0, 20.0]
            steer_max_v = [1.0, 0.5]

            [lateral_tuning]
            kp_bp = [0.0]
            kp_v = [0.2]
            ki_bp = [0.0]
            ki_v = [0.05]
            kf = 0.00006
            "#,
        )
        .unwrap();

        assert_eq!(params.steer_control_type, SteerControlType::Angle);
        assert_eq!(params.steer_max_v, vec![1.0, 0.5]);
        assert_eq!(params.lateral_tuning.kp_v, vec![0.2]);
    }
}
