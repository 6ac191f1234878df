//! Lateral control helper calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{LatCtrlError, SAT_CHECK_MIN_SPEED_MS};
use crate::pi_ctrl::GainSchedule;
use comms_if::{
    car::{CarParams, CarState, SteerControlType},
    plan::LateralPlan,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the maximum steering command schedule from the vehicle's steer max
/// table.
///
/// The table is held to the same rules as the gain schedules, a malformed
/// table is an error rather than a silent zero command.
pub fn steer_max_schedule(params: &CarParams) -> Result<GainSchedule, LatCtrlError> {
    GainSchedule::new(params.steer_max_bp.clone(), params.steer_max_v.clone())
        .map_err(LatCtrlError::InvalidSteerMax)
}

/// Calculate the feedforward term for the desired steering angle.
///
/// For angle controlled vehicles this is just the desired angle. For torque
/// controlled vehicles the angle offset is removed, since it does not
/// contribute to the resistive torque, and the result is scaled by the square
/// of speed, as the realigning tire moment is roughly proportional to the
/// lateral acceleration.
pub fn calc_feedforward(
    steer_control_type: SteerControlType,
    angle_steers_des_deg: f64,
    lat_plan: &LateralPlan,
    v_ego_ms: f64,
) -> f64 {
    match steer_control_type {
        SteerControlType::Angle => angle_steers_des_deg,
        SteerControlType::Torque => {
            (angle_steers_des_deg - lat_plan.angle_offset_deg) * v_ego_ms.powi(2)
        }
    }
}

/// Whether saturation of the controller output should be counted this cycle.
///
/// Saturation is only meaningful at speed, and not while the actuator is rate
/// limited or the driver is overriding.
pub fn check_saturation(car_state: &CarState) -> bool {
    car_state.v_ego_ms > SAT_CHECK_MIN_SPEED_MS
        && !car_state.steering_rate_limited
        && !car_state.steering_pressed
}
