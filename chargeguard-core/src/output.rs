//! Output Drivers for the Alternator Field
//!
//! ## Overview
//!
//! The alternator is switched either by a relay on its excitation line or
//! by a MOSFET driven with PWM. Both sit behind one trait, [`OutputDriver`],
//! so the controller never branches on hardware flags. Callers that want
//! duty control check [`OutputDriver::is_duty_capable`] first; on a relay
//! `set_duty` does nothing.
//!
//! ## Polarity
//!
//! Many relay boards and gate drivers are active-low. The `active_low` flag
//! is applied at the pin, so every value the driver reports (`is_active`,
//! `duty`, `command`) is logical, never physical.
//!
//! ## Failure model
//!
//! Writes are fire-and-forget. A failed pin write is logged and otherwise
//! ignored; there is no read-back channel, so a welded relay or a dead
//! MOSFET is invisible to the core.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::errors::{ConfigError, ConfigResult};

/// Which kind of actuator is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputMode {
    Relay,
    Pwm,
}

impl OutputMode {
    pub const fn name(&self) -> &'static str {
        match self {
            OutputMode::Relay => "relay",
            OutputMode::Pwm => "pwm",
        }
    }
}

/// What the hardware is being told to do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    Inactive,
    /// Fully on (relay closed, or PWM at maximum duty)
    Active,
    /// Variable duty in `[0, max_duty]`
    Duty(u16),
}

/// Common capability surface for relay and PWM outputs
pub trait OutputDriver {
    /// Switch fully on or fully off
    fn set_active(&mut self, active: bool);

    /// Command a duty in `[0, max_duty]`; values above are clamped.
    /// No-op on outputs that are not duty-capable.
    fn set_duty(&mut self, duty: u16);

    /// Force the output inactive. Idempotent.
    fn turn_off(&mut self);

    fn is_active(&self) -> bool;

    fn duty(&self) -> u16;

    fn is_duty_capable(&self) -> bool;

    fn max_duty(&self) -> u16;

    fn mode(&self) -> OutputMode;

    /// Duty as a whole percentage of `max_duty`, rounded down
    fn duty_percent(&self) -> u8 {
        let max = self.max_duty() as u32;
        if max == 0 {
            return 0;
        }
        ((self.duty() as u32).min(max) * 100 / max) as u8
    }

    /// The command last issued, in logical terms
    fn command(&self) -> OutputCommand {
        if self.is_duty_capable() {
            match self.duty() {
                0 => OutputCommand::Inactive,
                d if d >= self.max_duty() => OutputCommand::Active,
                d => OutputCommand::Duty(d),
            }
        } else if self.is_active() {
            OutputCommand::Active
        } else {
            OutputCommand::Inactive
        }
    }

    /// Re-issue a previously captured command
    fn apply(&mut self, command: OutputCommand) {
        match command {
            OutputCommand::Inactive => self.turn_off(),
            OutputCommand::Active => self.set_active(true),
            OutputCommand::Duty(duty) => self.set_duty(duty),
        }
    }
}

impl<D: OutputDriver + ?Sized> OutputDriver for &mut D {
    fn set_active(&mut self, active: bool) {
        (**self).set_active(active)
    }
    fn set_duty(&mut self, duty: u16) {
        (**self).set_duty(duty)
    }
    fn turn_off(&mut self) {
        (**self).turn_off()
    }
    fn is_active(&self) -> bool {
        (**self).is_active()
    }
    fn duty(&self) -> u16 {
        (**self).duty()
    }
    fn is_duty_capable(&self) -> bool {
        (**self).is_duty_capable()
    }
    fn max_duty(&self) -> u16 {
        (**self).max_duty()
    }
    fn mode(&self) -> OutputMode {
        (**self).mode()
    }
}

/// Relay on a digital output pin
///
/// Reports a one-step duty scale (`max_duty() == 1`) so duty-based
/// consumers still see 0 % or 100 %.
pub struct RelayDriver<P> {
    pin: P,
    active_low: bool,
    active: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the pin and drive it to the inactive level
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut driver = Self { pin, active_low, active: false };
        driver.turn_off();
        driver
    }

    fn write(&mut self, active: bool) {
        // Physical level is high when logical state and polarity disagree
        let high = active != self.active_low;
        let result = if high { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            log_warn!("relay pin write failed (active={})", active);
        }
        self.active = active;
    }

    /// Release the pin, e.g. to hand it back to the HAL
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputDriver for RelayDriver<P> {
    fn set_active(&mut self, active: bool) {
        self.write(active);
    }

    fn set_duty(&mut self, _duty: u16) {}

    fn turn_off(&mut self) {
        self.write(false);
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn duty(&self) -> u16 {
        self.active as u16
    }

    fn is_duty_capable(&self) -> bool {
        false
    }

    fn max_duty(&self) -> u16 {
        1
    }

    fn mode(&self) -> OutputMode {
        OutputMode::Relay
    }
}

/// MOSFET gate driven by a PWM channel
///
/// Duty is tracked on the driver's own scale `[0, max_duty]` and mapped
/// onto the channel's resolution when written.
pub struct PwmDriver<C> {
    channel: C,
    active_low: bool,
    max_duty: u16,
    duty: u16,
}

impl<C: SetDutyCycle> PwmDriver<C> {
    /// Use the channel's own resolution as the duty scale
    pub fn new(channel: C, active_low: bool) -> ConfigResult<Self> {
        let max_duty = channel.max_duty_cycle();
        Self::with_max_duty(channel, active_low, max_duty)
    }

    /// Use a custom duty scale, e.g. 800 counts on a 10-bit channel
    pub fn with_max_duty(channel: C, active_low: bool, max_duty: u16) -> ConfigResult<Self> {
        if max_duty == 0 || channel.max_duty_cycle() == 0 {
            return Err(ConfigError::ZeroMaxDuty);
        }

        let mut driver = Self { channel, active_low, max_duty, duty: 0 };
        driver.turn_off();
        Ok(driver)
    }

    fn write(&mut self, duty: u16) {
        let duty = duty.min(self.max_duty);
        let channel_max = self.channel.max_duty_cycle() as u32;
        let mut hw = (duty as u32 * channel_max / self.max_duty as u32) as u16;
        if self.active_low {
            hw = channel_max as u16 - hw;
        }
        if self.channel.set_duty_cycle(hw).is_err() {
            log_warn!("pwm duty write failed (duty={})", duty);
        }
        self.duty = duty;
    }

    pub fn release(self) -> C {
        self.channel
    }
}

impl<C: SetDutyCycle> OutputDriver for PwmDriver<C> {
    fn set_active(&mut self, active: bool) {
        let duty = if active { self.max_duty } else { 0 };
        self.write(duty);
    }

    fn set_duty(&mut self, duty: u16) {
        self.write(duty);
    }

    fn turn_off(&mut self) {
        self.write(0);
    }

    fn is_active(&self) -> bool {
        self.duty > 0
    }

    fn duty(&self) -> u16 {
        self.duty
    }

    fn is_duty_capable(&self) -> bool {
        true
    }

    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn mode(&self) -> OutputMode {
        OutputMode::Pwm
    }
}
