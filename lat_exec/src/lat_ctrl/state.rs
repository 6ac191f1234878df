//! Lateral control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::pi_ctrl::{GainSchedule, PiController, DEFAULT_RATE_HZ};
use comms_if::{
    car::{CarParams, CarState},
    plan::LateralPlan,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral PID controller state.
///
/// Created once per drive, `update` must be called once per control cycle at
/// the rate given at construction.
pub struct LatCtrlPid<T: TuningSource> {
    /// The PI controller performing the closed loop calculations
    pid: PiController,

    /// Maximum steering command over speed, from the vehicle parameters
    steer_max: GainSchedule,

    /// Error deadzone.
    ///
    /// Units: degrees
    deadzone_deg: f64,

    /// The last desired angle received while active.
    ///
    /// Units: degrees
    angle_steers_des_deg: f64,

    /// Number of cycles since the tuning source was last polled
    tune_frame: u32,

    /// Source of live tuning overrides
    tuning: T,

    /// Rate the controller is updated at.
    ///
    /// Units: Hz
    rate_hz: f64,
}

/// Output command from LatCtrl that the steering actuator must execute.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct OutputData {
    /// Steering actuator command, bounded by the speed dependent steer max.
    pub steer_cmd: f64,

    /// The desired steering angle the command was computed for. While
    /// inactive this is the last angle received while active.
    ///
    /// Units: degrees
    pub angle_steers_des_deg: f64,
}

/// Diagnostic state of the lateral PID controller for a single cycle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct LatPidState {
    /// Measured steering angle.
    ///
    /// Units: degrees
    pub steering_angle_deg: f64,

    /// Measured steering rate.
    ///
    /// Units: degrees/second
    pub steering_rate_degs: f64,

    /// True if closed loop control ran this cycle
    pub active: bool,

    /// Proportional term
    pub p: f64,

    /// Integral term
    pub i: f64,

    /// Feedforward term
    pub f: f64,

    /// Controller output
    pub output: f64,

    /// True if the output has been saturated for longer than the steer limit
    /// timer
    pub saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: TuningSource> LatCtrlPid<T> {
    /// Create a new controller running at the default rate.
    ///
    /// The gains are taken from the vehicle's parameters, and the initial
    /// deadzone from the tuning source.
    pub fn new(params: &CarParams, tuning: T) -> Result<Self, LatCtrlError> {
        Self::with_rate(params, tuning, DEFAULT_RATE_HZ)
    }

    /// Create a new controller which will be updated at `rate_hz`.
    pub fn with_rate(params: &CarParams, mut tuning: T, rate_hz: f64) -> Result<Self, LatCtrlError> {
        let tune = &params.lateral_tuning;

        let pid = PiController::new(
            GainSchedule::new(tune.kp_bp.clone(), tune.kp_v.clone())?,
            GainSchedule::new(tune.ki_bp.clone(), tune.ki_v.clone())?,
            tune.kf,
            INIT_OUTPUT_LIMIT,
            -INIT_OUTPUT_LIMIT,
            params.steer_limit_timer_s,
            rate_hz,
        )?;

        let steer_max = steer_max_schedule(params)?;

        let deadzone_deg = tuning.fetch().deadzone_deg;
        if !(deadzone_deg.is_finite() && deadzone_deg >= 0.0) {
            return Err(LatCtrlError::InvalidDeadzone(deadzone_deg));
        }

        Ok(Self {
            pid,
            steer_max,
            deadzone_deg,
            angle_steers_des_deg: 0.0,
            tune_frame: 0,
            tuning,
            rate_hz,
        })
    }

    /// Reset the PI controller's integrator and saturation state.
    pub fn reset(&mut self) {
        self.pid.reset();
    }

    /// Poll the tuning source if the tuning period has elapsed, applying any
    /// override it requests.
    ///
    /// The new PI controller is fully built before it replaces the current
    /// one, so a rejected override leaves the controller untouched.
    pub fn poll_tuning(&mut self, params: &CarParams) {
        self.tune_frame += 1;

        if self.tune_frame < TUNE_PERIOD_CYCLES {
            return;
        }
        self.tune_frame = 0;

        let payload = self.tuning.fetch();
        debug!("Polled tuning source: {:?}", payload);

        if !payload.apply_override {
            return;
        }

        match self.build_tuned_pid(params, &payload) {
            Ok(pid) => {
                self.pid = pid;
                self.deadzone_deg = payload.deadzone_deg;

                info!(
                    "Live tuning applied: k_p = {}, k_i = {}, k_f = {}, deadzone = {} deg",
                    payload.k_p, payload.k_i, payload.k_f, payload.deadzone_deg
                );
            }
            Err(e) => warn!("Live tuning rejected, keeping current gains: {}", e),
        }
    }

    /// Compute the steering command for this cycle.
    ///
    /// - `active`: true if lateral control is engaged.
    pub fn update(
        &mut self,
        active: bool,
        car_state: &CarState,
        params: &CarParams,
        lat_plan: &LateralPlan,
    ) -> (OutputData, LatPidState) {
        self.poll_tuning(params);

        let mut pid_state = LatPidState {
            steering_angle_deg: car_state.steering_angle_deg,
            steering_rate_degs: car_state.steering_rate_degs,
            ..Default::default()
        };

        let steer_cmd;

        if car_state.v_ego_ms < MIN_ACTIVE_SPEED_MS || !active {
            steer_cmd = 0.0;
            pid_state.active = false;
            self.pid.reset();
        } else {
            self.angle_steers_des_deg = lat_plan.steering_angle_deg;

            let steer_max = self.steer_max(car_state.v_ego_ms);
            self.pid.pos_limit = steer_max;
            self.pid.neg_limit = -steer_max;

            let steer_feedforward = calc_feedforward(
                params.steer_control_type,
                self.angle_steers_des_deg,
                lat_plan,
                car_state.v_ego_ms,
            );

            steer_cmd = self.pid.step(
                self.angle_steers_des_deg,
                car_state.steering_angle_deg,
                check_saturation(car_state),
                car_state.steering_pressed,
                steer_feedforward,
                car_state.v_ego_ms,
                self.deadzone_deg,
            );

            pid_state.active = true;
            pid_state.p = self.pid.p();
            pid_state.i = self.pid.i();
            pid_state.f = self.pid.f();
            pid_state.output = steer_cmd;
            pid_state.saturated = self.pid.saturated();
        }

        trace!(
            "LatCtrl: active {}, des {:.3} deg, meas {:.3} deg, cmd {:.4}",
            pid_state.active,
            self.angle_steers_des_deg,
            car_state.steering_angle_deg,
            steer_cmd
        );

        (
            OutputData {
                steer_cmd,
                angle_steers_des_deg: self.angle_steers_des_deg,
            },
            pid_state,
        )
    }

    /// Build a PI controller from a tuning override.
    fn build_tuned_pid(
        &self,
        params: &CarParams,
        payload: &TuningPayload,
    ) -> Result<PiController, LatCtrlError> {
        if !(payload.deadzone_deg.is_finite() && payload.deadzone_deg >= 0.0) {
            return Err(LatCtrlError::InvalidDeadzone(payload.deadzone_deg));
        }

        // Limits are set symmetrically here, they are replaced by the speed
        // dependent limits on the next active cycle anyway.
        Ok(PiController::new(
            GainSchedule::constant(payload.k_p)?,
            GainSchedule::constant(payload.k_i)?,
            payload.k_f,
            INIT_OUTPUT_LIMIT,
            -INIT_OUTPUT_LIMIT,
            params.steer_limit_timer_s,
            self.rate_hz,
        )?)
    }

    /// Maximum steering command at the given speed.
    pub fn steer_max(&self, v_ego_ms: f64) -> f64 {
        self.steer_max.eval(v_ego_ms)
    }

    /// The PI controller
    pub fn pid(&self) -> &PiController {
        &self.pid
    }

    /// Current error deadzone in degrees
    pub fn deadzone_deg(&self) -> f64 {
        self.deadzone_deg
    }

    /// The last desired angle received while active, in degrees
    pub fn angle_steers_des_deg(&self) -> f64 {
        self.angle_steers_des_deg
    }

    /// Number of cycles since the tuning source was last polled
    pub fn tune_frame(&self) -> u32 {
        self.tune_frame
    }

    /// The tuning source being polled
    pub fn tuning_source(&self) -> &T {
        &self.tuning
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::car::{LatPidTuning, SteerControlType};
    use std::collections::VecDeque;

    /// Tuning source returning a sequence of payloads, then no-ops.
    struct SeqTuning(VecDeque<TuningPayload>);

    impl TuningSource for SeqTuning {
        fn fetch(&mut self) -> TuningPayload {
            self.0.pop_front().unwrap_or_else(TuningPayload::no_op)
        }
    }

    fn car_params(steer_control_type: SteerControlType) -> CarParams {
        CarParams {
            steer_control_type,
            steer_limit_timer_s: 0.5,
            steer_max_bp: vec![0.0, 20.0],
            steer_max_v: vec![2.0, 1.5],
            lateral_tuning: LatPidTuning {
                kp_bp: vec![0.0],
                kp_v: vec![0.2],
                ki_bp: vec![0.0],
                ki_v: vec![0.05],
                kf: 0.01,
            },
        }
    }

    fn car_state(v_ego_ms: f64, steering_angle_deg: f64) -> CarState {
        CarState {
            v_ego_ms,
            steering_angle_deg,
            steering_rate_degs: 1.5,
            ..Default::default()
        }
    }

    fn plan(steering_angle_deg: f64) -> LateralPlan {
        LateralPlan {
            steering_angle_deg,
            angle_offset_deg: 0.0,
        }
    }

    #[test]
    fn test_active_scenario() {
        let params = car_params(SteerControlType::Angle);
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        let (out, state) = ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(5.0));

        let steer_max = ctrl.steer_max(15.0);
        assert!(state.active);
        assert!(state.p != 0.0);
        assert!(!state.saturated);
        assert_eq!(state.output, out.steer_cmd);
        assert_eq!(state.steering_angle_deg, 0.0);
        assert_eq!(state.steering_rate_degs, 1.5);
        assert!(out.steer_cmd <= steer_max && out.steer_cmd >= -steer_max);
        assert_eq!(out.angle_steers_des_deg, 5.0);

        // Angle mode feedforward is the desired angle
        assert!((state.f - 5.0 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_inactive_resets() {
        let params = car_params(SteerControlType::Angle);
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        for _ in 0..50 {
            ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(2.0));
        }
        assert!(ctrl.pid().i() > 0.0);

        let (out, state) = ctrl.update(false, &car_state(15.0, 0.0), &params, &plan(8.0));

        assert_eq!(out.steer_cmd, 0.0);
        assert!(!state.active);
        assert_eq!(state.p, 0.0);
        assert_eq!(state.output, 0.0);
        assert_eq!(ctrl.pid().i(), 0.0);

        // The last active desired angle is reported, not the new one
        assert_eq!(out.angle_steers_des_deg, 2.0);
        assert_eq!(ctrl.angle_steers_des_deg(), 2.0);
    }

    #[test]
    fn test_low_speed_inhibits() {
        let params = car_params(SteerControlType::Torque);
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        for _ in 0..50 {
            ctrl.update(true, &car_state(5.0, 0.0), &params, &plan(2.0));
        }
        assert!(ctrl.pid().i() > 0.0);

        let (out, state) = ctrl.update(true, &car_state(0.29, 0.0), &params, &plan(2.0));

        assert_eq!(out.steer_cmd, 0.0);
        assert!(!state.active);
        assert_eq!(ctrl.pid().i(), 0.0);

        // At the threshold control is active again
        let (_, state) = ctrl.update(true, &car_state(0.3, 0.0), &params, &plan(2.0));
        assert!(state.active);
    }

    #[test]
    fn test_torque_feedforward() {
        let params = car_params(SteerControlType::Torque);
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        let lat_plan = LateralPlan {
            steering_angle_deg: 10.0,
            angle_offset_deg: 2.0,
        };
        let (_, state) = ctrl.update(true, &car_state(5.0, 10.0), &params, &lat_plan);

        // (10 - 2) * 5^2 scaled by k_f
        assert!((state.f - 200.0 * 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_output_within_steer_max() {
        for &mode in &[SteerControlType::Angle, SteerControlType::Torque] {
            let params = car_params(mode);
            let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

            for i in 0..2000 {
                let v = 0.5 + (i % 70) as f64 * 0.5;
                let des = ((i as f64) * 0.37).sin() * 90.0;
                let meas = ((i as f64) * 0.11).cos() * 45.0;

                let mut cs = car_state(v, meas);
                cs.steering_pressed = i % 13 == 0;
                cs.steering_rate_limited = i % 7 == 0;

                let (out, state) = ctrl.update(true, &cs, &params, &plan(des));
                let steer_max = ctrl.steer_max(v);

                assert!(state.active);
                assert!(out.steer_cmd <= steer_max);
                assert!(out.steer_cmd >= -steer_max);
            }
        }
    }

    #[test]
    fn test_saturation_reported() {
        let mut params = car_params(SteerControlType::Angle);
        params.lateral_tuning.kp_v = vec![1.0];
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        // Large error at speed saturates the output, the flag is raised once
        // the steer limit timer has elapsed
        let mut saturated = false;
        for _ in 0..100 {
            let (_, state) = ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(45.0));
            saturated |= state.saturated;
        }
        assert!(saturated);

        // But not while rate limited
        ctrl.reset();
        for _ in 0..100 {
            let mut cs = car_state(15.0, 0.0);
            cs.steering_rate_limited = true;
            let (_, state) = ctrl.update(true, &cs, &params, &plan(45.0));
            assert!(!state.saturated);
        }

        // Nor below the saturation check speed
        ctrl.reset();
        for _ in 0..100 {
            let (_, state) = ctrl.update(true, &car_state(9.0, 0.0), &params, &plan(45.0));
            assert!(!state.saturated);
        }
    }

    #[test]
    fn test_reset_idempotent() {
        let params = car_params(SteerControlType::Angle);
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();

        for _ in 0..20 {
            ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(3.0));
        }

        ctrl.reset();
        assert_eq!(ctrl.pid().i(), 0.0);
        ctrl.reset();
        assert_eq!(ctrl.pid().i(), 0.0);
        assert!(!ctrl.pid().saturated());
    }

    #[test]
    fn test_tuning_reload() {
        let params = car_params(SteerControlType::Angle);
        let initial = TuningPayload {
            deadzone_deg: 0.1,
            ..Default::default()
        };
        let tuned = TuningPayload {
            apply_override: true,
            k_p: 0.5,
            k_i: 0.2,
            k_f: 0.003,
            deadzone_deg: 0.25,
        };
        let mut ctrl =
            LatCtrlPid::new(&params, SeqTuning(vec![initial, tuned].into())).unwrap();

        assert_eq!(ctrl.deadzone_deg(), 0.1);

        for _ in 0..(TUNE_PERIOD_CYCLES - 1) {
            ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(1.0));
        }

        // Prior gains are unchanged before the 300th cycle
        assert_eq!(ctrl.deadzone_deg(), 0.1);
        assert_eq!(ctrl.pid().k_p().values(), &[0.2]);
        assert_eq!(ctrl.pid().k_i().values(), &[0.05]);
        assert_eq!(ctrl.pid().k_f(), 0.01);
        assert_eq!(ctrl.tune_frame(), TUNE_PERIOD_CYCLES - 1);

        ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(1.0));

        assert_eq!(ctrl.tune_frame(), 0);
        assert_eq!(ctrl.deadzone_deg(), 0.25);
        assert_eq!(ctrl.pid().k_p().eval(15.0), 0.5);
        assert_eq!(ctrl.pid().k_i().eval(15.0), 0.2);
        assert_eq!(ctrl.pid().k_f(), 0.003);
        assert_eq!(ctrl.pid().sat_limit_s(), params.steer_limit_timer_s);
    }

    #[test]
    fn test_tuning_polled_while_inactive() {
        let params = car_params(SteerControlType::Angle);
        let tuned = TuningPayload {
            apply_override: true,
            k_p: 0.5,
            ..Default::default()
        };
        let mut ctrl = LatCtrlPid::new(&params, StaticTuning::new(tuned)).unwrap();
        assert_eq!(ctrl.tuning_source().num_fetches(), 1);

        for _ in 0..(2 * TUNE_PERIOD_CYCLES) {
            ctrl.update(false, &car_state(0.0, 0.0), &params, &plan(0.0));
        }

        assert_eq!(ctrl.tuning_source().num_fetches(), 3);
        assert_eq!(ctrl.pid().k_p().eval(0.0), 0.5);
    }

    #[test]
    fn test_tuning_without_override() {
        let params = car_params(SteerControlType::Angle);
        let payload = TuningPayload {
            apply_override: false,
            k_p: 5.0,
            k_i: 5.0,
            k_f: 5.0,
            deadzone_deg: 0.0,
        };
        let mut ctrl = LatCtrlPid::new(&params, StaticTuning::new(payload)).unwrap();

        for _ in 0..TUNE_PERIOD_CYCLES {
            ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(1.0));
        }

        assert_eq!(ctrl.tuning_source().num_fetches(), 2);
        assert_eq!(ctrl.pid().k_p().values(), &[0.2]);
        assert_eq!(ctrl.pid().k_f(), 0.01);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let params = car_params(SteerControlType::Angle);
        let bad = TuningPayload {
            apply_override: true,
            k_p: 0.5,
            k_i: 0.2,
            k_f: 0.003,
            deadzone_deg: -1.0,
        };
        let mut ctrl = LatCtrlPid::new(
            &params,
            SeqTuning(vec![TuningPayload::no_op(), bad].into()),
        )
        .unwrap();

        for _ in 0..TUNE_PERIOD_CYCLES {
            ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(1.0));
        }

        assert_eq!(ctrl.deadzone_deg(), 0.0);
        assert_eq!(ctrl.pid().k_p().values(), &[0.2]);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = car_params(SteerControlType::Angle);
        params.lateral_tuning.kp_bp = vec![0.0, 10.0];

        assert!(matches!(
            LatCtrlPid::new(&params, NoTuning),
            Err(LatCtrlError::InvalidGains(_))
        ));
    }

    #[test]
    fn test_invalid_steer_max() {
        // A steer max table that can't be evaluated would otherwise leave the
        // controller active with every command clamped to zero
        let mut params = car_params(SteerControlType::Angle);
        params.steer_max_v = vec![1.0];

        assert!(matches!(
            LatCtrlPid::new(&params, NoTuning),
            Err(LatCtrlError::InvalidSteerMax(_))
        ));

        params.steer_max_bp = vec![20.0];
        let mut ctrl = LatCtrlPid::new(&params, NoTuning).unwrap();
        let (out, state) = ctrl.update(true, &car_state(15.0, 0.0), &params, &plan(20.0));

        assert!(state.active);
        assert_eq!(out.steer_cmd, 1.0);
    }
}
