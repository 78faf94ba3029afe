//! Floating-point PID regulator for the field duty
//!
//! Classic parallel form. Each step is told how long it has been since the
//! previous one, so a late or irregular caller still integrates real time:
//!
//! ```text
//! error  = setpoint - input
//! output = kp*error + ki*∫error dt + kd*d(error)/dt
//! ```
//!
//! The integral uses the trapezoid rule and is clamped so that `ki * integral`
//! alone can never exceed the output range (anti-windup). The first step after
//! construction or `reset` has no derivative kick.

use crate::constants::time::MS_PER_SECOND;

/// Controller gains, in duty counts per volt (per second for `ki`,
/// times seconds for `kd`)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

pub struct Pid {
    gains: PidGains,
    setpoint: f32,
    out_min: f32,
    out_max: f32,
    integral: f32,
    previous_error: Option<f32>,
    output: f32,
}

impl Pid {
    pub fn new(gains: PidGains, setpoint: f32, out_min: f32, out_max: f32) -> Self {
        Self {
            gains,
            setpoint,
            out_min,
            out_max,
            integral: 0.0,
            previous_error: None,
            output: 0.0,
        }
    }

    /// Run one evaluation `dt_ms` after the previous one and return the
    /// clamped output
    pub fn step(&mut self, input: f32, dt_ms: u64) -> f32 {
        let dt_s = dt_ms as f32 / MS_PER_SECOND as f32;
        let error = self.setpoint - input;
        let previous = self.previous_error.unwrap_or(error);

        self.integral += (error + previous) * 0.5 * dt_s;
        if self.gains.ki != 0.0 {
            let bound = libm::fabsf(self.out_max.max(-self.out_min) / self.gains.ki);
            if bound.is_finite() {
                self.integral = self.integral.clamp(-bound, bound);
            }
        }

        let p = self.gains.kp * error;
        let i = self.gains.ki * self.integral;
        let d = if dt_s > 0.0 {
            self.gains.kd * (error - previous) / dt_s
        } else {
            0.0
        };
        self.previous_error = Some(error);

        let raw = p + i + d;
        // NaN from pathological gains collapses to the safe end
        self.output = if raw.is_nan() {
            self.out_min
        } else {
            raw.clamp(self.out_min, self.out_max)
        };
        self.output
    }

    /// Drop the accumulated integral and derivative history
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = None;
        self.output = 0.0;
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f32, ki: f32, kd: f32) -> PidGains {
        PidGains { kp, ki, kd }
    }

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new(gains(100.0, 0.0, 0.0), 14.4, 0.0, 1023.0);
        // 0.2 V under setpoint → 20 counts
        assert!((pid.step(14.2, 100) - 20.0).abs() < 1e-3);
        // Above setpoint clamps at zero
        assert_eq!(pid.step(14.6, 100), 0.0);
    }

    #[test]
    fn integral_accumulates_and_resets() {
        let mut pid = Pid::new(gains(0.0, 10.0, 0.0), 14.4, 0.0, 1023.0);
        pid.step(14.0, 1000);
        pid.step(14.0, 1000);
        // 0.4 V error for 2 s at ki=10
        assert!((pid.output() - 8.0).abs() < 1e-3);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.output(), 0.0);
    }

    #[test]
    fn integral_is_bounded() {
        let mut pid = Pid::new(gains(0.0, 1.0, 0.0), 14.4, 0.0, 100.0);
        for _ in 0..10_000 {
            pid.step(0.0, 1000);
        }
        assert!(pid.integral() <= 100.0);

        // Unwinds once the error flips
        for _ in 0..200 {
            pid.step(20.0, 1000);
        }
        assert_eq!(pid.output(), 0.0);
    }

    #[test]
    fn no_derivative_kick_on_first_step() {
        let mut pid = Pid::new(gains(0.0, 0.0, 50.0), 14.4, -1000.0, 1000.0);
        assert_eq!(pid.step(10.0, 100), 0.0);
        // Error shrinks by 1 V in 0.1 s → -500
        assert!((pid.step(11.0, 100) + 500.0).abs() < 1e-2);
    }

    #[test]
    fn uneven_steps_integrate_elapsed_time() {
        let mut pid = Pid::new(gains(0.0, 100.0, 0.0), 14.4, 0.0, 1023.0);
        pid.step(14.2, 100);
        pid.step(14.2, 500);
        pid.step(14.2, 40);
        // 0.2 V for 0.64 s at ki=100
        assert!((pid.output() - 12.8).abs() < 1e-2);
    }

    #[test]
    fn derivative_scales_with_elapsed_time() {
        let mut pid = Pid::new(gains(0.0, 0.0, 50.0), 14.4, -1000.0, 1000.0);
        pid.step(10.0, 100);
        // Same 1 V change spread over 0.5 s
        assert!((pid.step(11.0, 500) + 100.0).abs() < 1e-2);
        // Zero elapsed time contributes no derivative
        assert_eq!(pid.step(12.0, 0), 0.0);
    }

    #[test]
    fn nan_gains_fall_to_minimum() {
        let mut pid = Pid::new(gains(f32::NAN, 0.0, 0.0), 14.4, 0.0, 1023.0);
        assert_eq!(pid.step(13.0, 100), 0.0);
    }
}
