//! Charge Controller State Machine
//!
//! ## Overview
//!
//! Decides, once per control tick, what the alternator output should do
//! given the filtered battery voltage and the current time. Two strategies
//! are available and one is picked at startup:
//!
//! ### Hysteresis (relay or PWM at full scale)
//!
//! ```text
//!              voltage < low  AND  lockout elapsed
//!   ┌──────────┐ ─────────────────────────────────▶ ┌────────┐
//!   │ Inactive │                                    │ Active │
//!   └──────────┘ ◀───────────────────────────────── └────────┘
//!                       voltage > high (always)
//! ```
//!
//! The lockout only gates activation. Over-voltage cuts the field at once,
//! whatever happened a moment ago.
//!
//! ### PID (PWM only)
//!
//! Runs at most every `sample_interval_ms`, stepping the PID by the time
//! actually elapsed since the previous evaluation. Safety clamps come first
//! and skip the PID math entirely, leaving its integral where it was:
//!
//! 1. `voltage >= high` → duty 0
//! 2. `voltage <= low`  → duty `max_duty`
//! 3. otherwise one PID step toward `setpoint`, then a slew limit of
//!    `max_duty / 10` counts per evaluation
//!
//! Ticks between evaluations issue nothing and the previous duty holds.
//!
//! ## Ownership
//!
//! The controller owns its state and touches the output only through the
//! `&mut` driver handed to `evaluate`. Nothing else writes to it.

use crate::constants::{
    charging::{
        DEFAULT_HIGH_THRESHOLD_V, DEFAULT_LOW_THRESHOLD_V, DEFAULT_LOCKOUT_MS,
        DEFAULT_SETPOINT_V, DEFAULT_KP, DEFAULT_KI, DEFAULT_KD, SLEW_DIVISOR,
    },
    time::DEFAULT_SAMPLE_INTERVAL_MS,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::output::OutputDriver;
use crate::pid::{Pid, PidGains};
use crate::time::{elapsed_ms, SoftTimer, Timestamp};

/// Control strategy, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ControlStrategy {
    Hysteresis,
    Pid,
}

impl ControlStrategy {
    pub const fn name(&self) -> &'static str {
        match self {
            ControlStrategy::Hysteresis => "hysteresis",
            ControlStrategy::Pid => "pid",
        }
    }
}

/// Immutable controller parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Deactivate (hysteresis) or cut to zero duty (PID) above this voltage
    pub high: f32,
    /// Activate (hysteresis) or force full duty (PID) below this voltage
    pub low: f32,
    /// Minimum time after a transition before re-activation
    pub lockout_ms: u64,
    pub strategy: ControlStrategy,
    pub gains: PidGains,
    /// PID regulation target (volts)
    pub setpoint: f32,
    /// PID evaluation period
    pub sample_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH_THRESHOLD_V,
            low: DEFAULT_LOW_THRESHOLD_V,
            lockout_ms: DEFAULT_LOCKOUT_MS,
            strategy: ControlStrategy::Hysteresis,
            gains: PidGains { kp: DEFAULT_KP, ki: DEFAULT_KI, kd: DEFAULT_KD },
            setpoint: DEFAULT_SETPOINT_V,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.high.is_finite() {
            return Err(ConfigError::NonFiniteParameter { name: "controller.high" });
        }
        if !self.low.is_finite() {
            return Err(ConfigError::NonFiniteParameter { name: "controller.low" });
        }
        if self.low >= self.high {
            return Err(ConfigError::InvalidThresholds { low: self.low, high: self.high });
        }

        if self.strategy == ControlStrategy::Pid {
            if !self.gains.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name: "controller.gains" });
            }
            if !(self.setpoint > self.low && self.setpoint < self.high) {
                return Err(ConfigError::InvalidSetpoint {
                    setpoint: self.setpoint,
                    low: self.low,
                    high: self.high,
                });
            }
            if self.sample_interval_ms == 0 {
                return Err(ConfigError::ZeroInterval { name: "controller.sample_interval_ms" });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Inactive,
    Active,
}

/// What a single evaluation did to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Hysteresis switched the output on
    Activated,
    /// Hysteresis switched the output off
    Deactivated,
    /// PID evaluation commanded this duty (possibly unchanged)
    Duty(u16),
    /// Nothing issued; previous command holds
    Held,
}

pub struct ChargeController {
    config: ControllerConfig,
    state: ChargeState,
    last_transition_at: Option<Timestamp>,
    pid: Pid,
    pid_timer: SoftTimer,
    last_pid_at: Option<Timestamp>,
    max_duty: u16,
    duty: u16,
}

impl ChargeController {
    /// `max_duty` is the duty scale of the driver this controller will command
    pub fn new(config: ControllerConfig, max_duty: u16) -> Self {
        Self {
            pid: Pid::new(config.gains, config.setpoint, 0.0, max_duty as f32),
            pid_timer: SoftTimer::new(config.sample_interval_ms),
            last_pid_at: None,
            config,
            state: ChargeState::Inactive,
            last_transition_at: None,
            max_duty,
            duty: 0,
        }
    }

    /// Run one control tick
    pub fn evaluate<D: OutputDriver + ?Sized>(
        &mut self,
        voltage: f32,
        now: Timestamp,
        driver: &mut D,
    ) -> ControlAction {
        match self.config.strategy {
            ControlStrategy::Hysteresis => self.evaluate_hysteresis(voltage, now, driver),
            ControlStrategy::Pid => self.evaluate_pid(voltage, now, driver),
        }
    }

    fn evaluate_hysteresis<D: OutputDriver + ?Sized>(
        &mut self,
        voltage: f32,
        now: Timestamp,
        driver: &mut D,
    ) -> ControlAction {
        match self.state {
            ChargeState::Inactive if voltage < self.config.low && self.lockout_elapsed(now) => {
                driver.set_active(true);
                self.duty = self.max_duty;
                self.transition(ChargeState::Active, now);
                log_info!("charge on at {} V (t={})", voltage, now);
                ControlAction::Activated
            }
            ChargeState::Active if voltage > self.config.high => {
                driver.turn_off();
                self.duty = 0;
                self.transition(ChargeState::Inactive, now);
                log_info!("charge off at {} V (t={})", voltage, now);
                ControlAction::Deactivated
            }
            _ => ControlAction::Held,
        }
    }

    fn evaluate_pid<D: OutputDriver + ?Sized>(
        &mut self,
        voltage: f32,
        now: Timestamp,
        driver: &mut D,
    ) -> ControlAction {
        if !self.pid_timer.fire(now) {
            return ControlAction::Held;
        }
        // Callers rarely land exactly on the interval; integrate what really passed
        let dt_ms = self
            .last_pid_at
            .map_or(self.config.sample_interval_ms, |at| elapsed_ms(at, now));
        self.last_pid_at = Some(now);

        let duty = if voltage >= self.config.high {
            log_debug!("over-voltage clamp at {} V", voltage);
            0
        } else if voltage <= self.config.low {
            log_debug!("under-voltage clamp at {} V", voltage);
            self.max_duty
        } else {
            let raw = self.pid.step(voltage, dt_ms);
            let target = libm::roundf(raw).clamp(0.0, self.max_duty as f32) as u16;
            slew_limit(self.duty, target, self.max_step())
        };

        driver.set_duty(duty);
        self.duty = duty;

        let next = if duty > 0 { ChargeState::Active } else { ChargeState::Inactive };
        if next != self.state {
            self.transition(next, now);
        }

        ControlAction::Duty(duty)
    }

    fn lockout_elapsed(&self, now: Timestamp) -> bool {
        match self.last_transition_at {
            None => true,
            Some(at) => elapsed_ms(at, now) >= self.config.lockout_ms,
        }
    }

    fn transition(&mut self, next: ChargeState, now: Timestamp) {
        self.state = next;
        self.last_transition_at = Some(now);
    }

    /// Largest duty change allowed per PID evaluation
    pub fn max_step(&self) -> u16 {
        (self.max_duty / SLEW_DIVISOR).max(1)
    }

    /// Turn the output off and forget all history
    pub fn reset<D: OutputDriver + ?Sized>(&mut self, driver: &mut D) {
        driver.turn_off();
        self.state = ChargeState::Inactive;
        self.last_transition_at = None;
        self.duty = 0;
        self.pid.reset();
        self.pid_timer.reset();
        self.last_pid_at = None;
    }

    pub fn state(&self) -> ChargeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ChargeState::Active
    }

    pub fn last_transition_at(&self) -> Option<Timestamp> {
        self.last_transition_at
    }

    /// Duty last commanded by this controller
    pub fn duty(&self) -> u16 {
        self.duty
    }

    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    pub fn strategy(&self) -> ControlStrategy {
        self.config.strategy
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// Move from `previous` toward `target` by at most `max_step`
pub fn slew_limit(previous: u16, target: u16, max_step: u16) -> u16 {
    if target > previous {
        target.min(previous.saturating_add(max_step))
    } else {
        target.max(previous.saturating_sub(max_step))
    }
}
