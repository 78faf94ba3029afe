//! Status LED
//!
//! Solid while the alternator output is active; blinking (one toggle per
//! control tick) while it is off, so a glance at the board tells whether
//! the battery is being charged.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

pub struct StatusIndicator<P> {
    pin: P,
    active_low: bool,
    lit: bool,
}

impl<P: OutputPin> StatusIndicator<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut indicator = Self { pin, active_low, lit: false };
        indicator.write(false);
        indicator
    }

    /// Advance the pattern by one control tick
    pub fn update(&mut self, output_active: bool) {
        let lit = if output_active { true } else { !self.lit };
        self.write(lit);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn write(&mut self, lit: bool) {
        let high = lit != self.active_low;
        let result = if high { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            log_warn!("status led write failed");
        }
        self.lit = lit;
    }
}

/// Placeholder pin for boards without a status LED
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLed;

impl ErrorType for NoLed {
    type Error = Infallible;
}

impl OutputPin for NoLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_when_active_blinking_when_idle() {
        let mut led = StatusIndicator::new(NoLed, false);
        assert!(!led.is_lit());

        led.update(false);
        assert!(led.is_lit());
        led.update(false);
        assert!(!led.is_lit());
        led.update(false);
        assert!(led.is_lit());

        led.update(true);
        assert!(led.is_lit());
        led.update(true);
        assert!(led.is_lit());
    }
}
