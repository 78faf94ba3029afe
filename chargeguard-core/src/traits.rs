//! Hardware seams for the charge-control core
//!
//! Digital and PWM outputs use the `embedded-hal` 1.0 traits directly
//! (see [`output`](crate::output)). `embedded-hal` 1.0 dropped its ADC
//! trait, so the analog input gets a minimal one here.
//! Keep it simple - the core only ever needs one channel.

/// A single analog input channel
pub trait AnalogSource {
    /// Acquire one raw conversion in `[0, adc_max_count]`
    ///
    /// The core treats this read as infallible. Boards whose HAL can
    /// fail should retry or return the last good count.
    fn read_raw(&mut self) -> u16;
}

impl<T: AnalogSource + ?Sized> AnalogSource for &mut T {
    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}

/// Adapter turning any closure into an `AnalogSource`
///
/// Handy for HALs that expose `adc.read(&mut pin)` with a borrowed
/// converter, and for scripted inputs in tests.
pub struct AnalogFn<F>(pub F);

impl<F: FnMut() -> u16> AnalogSource for AnalogFn<F> {
    fn read_raw(&mut self) -> u16 {
        (self.0)()
    }
}
