//! Common test utilities for integration tests
//!
//! This module provides:
//! - Shared-handle mocks for the ADC, relay pin and PWM channel, so a test
//!   can keep poking at hardware the context has taken ownership of
//! - `Battery`, a crude lead-acid model that responds to the field output
//! - Conversions between volts and raw counts under the default divider

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use chargeguard_core::{
    constants::{
        DEFAULT_ADC_MAX_COUNT, DEFAULT_ADC_REFERENCE_V, DEFAULT_CALIBRATION_INPUT_V,
        DEFAULT_CALIBRATION_SAMPLE_V,
    },
    AnalogSource,
};
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

/// Raw count that reads as `volts` through the default calibration
pub fn counts_for(volts: f32) -> u16 {
    let ratio = DEFAULT_CALIBRATION_INPUT_V / DEFAULT_CALIBRATION_SAMPLE_V;
    let per_count = DEFAULT_ADC_REFERENCE_V / DEFAULT_ADC_MAX_COUNT as f32 * ratio;
    (volts / per_count).round().clamp(0.0, DEFAULT_ADC_MAX_COUNT as f32) as u16
}

/// ADC channel whose value the test sets from outside
#[derive(Clone, Default)]
pub struct MockAdc {
    raw: Rc<Cell<u16>>,
    reads: Rc<Cell<u32>>,
}

impl MockAdc {
    pub fn at_volts(volts: f32) -> Self {
        let adc = Self::default();
        adc.set_volts(volts);
        adc
    }

    pub fn set_raw(&self, raw: u16) {
        self.raw.set(raw);
    }

    pub fn set_volts(&self, volts: f32) {
        self.raw.set(counts_for(volts));
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl AnalogSource for MockAdc {
    fn read_raw(&mut self) -> u16 {
        self.reads.set(self.reads.get() + 1);
        self.raw.get()
    }
}

/// Relay pin that records its physical level
#[derive(Clone, Default)]
pub struct MockPin {
    high: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// PWM channel with a configurable resolution
#[derive(Clone)]
pub struct MockPwm {
    max: u16,
    duty: Rc<Cell<u16>>,
}

impl MockPwm {
    pub fn new(max: u16) -> Self {
        Self { max, duty: Rc::new(Cell::new(0)) }
    }

    pub fn raw_duty(&self) -> u16 {
        self.duty.get()
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty);
        Ok(())
    }
}

/// Battery with an alternator attached
///
/// Each step the voltage moves toward a target: `charging_v` scaled by the
/// field fraction when the engine turns, `resting_v` otherwise. A constant
/// load pulls it down a little so regulation has something to do.
pub struct Battery {
    pub voltage: f32,
    pub resting_v: f32,
    pub charging_v: f32,
    pub engine_running: bool,
    /// Fraction of the gap closed per step
    pub response: f32,
}

impl Battery {
    pub fn new(voltage: f32) -> Self {
        Self {
            voltage,
            resting_v: 12.4,
            charging_v: 15.2,
            engine_running: true,
            response: 0.2,
        }
    }

    /// Advance one step with the field driven at `field` in `[0, 1]`
    pub fn step(&mut self, field: f32) -> f32 {
        let target = if self.engine_running && field > 0.0 {
            self.resting_v + (self.charging_v - self.resting_v) * field
        } else {
            self.resting_v
        };
        self.voltage += (target - self.voltage) * self.response;
        self.voltage
    }
}
