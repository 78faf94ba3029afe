//! Battery Voltage Estimation
//!
//! ## Overview
//!
//! Converts raw ADC counts from the battery divider into a filtered,
//! calibrated voltage. Alternator ripple and relay switching put a lot of
//! noise on the sense line, so every reading is a moving average over the
//! last `N` conversions.
//!
//! ## Conversion
//!
//! ```text
//! volts = (mean_raw / adc_max_count) * adc_reference_volts * ratio
//! ratio = calibration_input_volts / calibration_sample_volts
//! ```
//!
//! The ratio folds the divider and any reference error into one number
//! measured once with a voltmeter, so resistor tolerances never need to be
//! known.
//!
//! ## Warm-up
//!
//! The window starts zeroed and the mean is always taken over all `N`
//! slots. During the first `N` samples after boot the estimate therefore
//! ramps up from zero. The control loop ignores the estimate until
//! [`VoltageEstimator::is_warmed_up`] reports a full window.

use crate::constants::{
    buffers::DEFAULT_FILTER_WINDOW,
    adc::{
        DEFAULT_ADC_MAX_COUNT, DEFAULT_ADC_REFERENCE_V,
        DEFAULT_CALIBRATION_INPUT_V, DEFAULT_CALIBRATION_SAMPLE_V,
    },
};
use crate::errors::{ConfigError, ConfigResult};
use crate::traits::AnalogSource;

/// Divider calibration, taken once with a voltmeter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Calibration {
    /// Battery voltage measured at B+ (volts)
    pub input_volts: f32,
    /// Voltage the board reported on its ADC pin at the same moment (volts)
    pub sample_volts: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            input_volts: DEFAULT_CALIBRATION_INPUT_V,
            sample_volts: DEFAULT_CALIBRATION_SAMPLE_V,
        }
    }
}

impl Calibration {
    /// Scale factor from pin voltage to battery voltage
    pub fn ratio(&self) -> f32 {
        self.input_volts / self.sample_volts
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let ok = self.input_volts.is_finite()
            && self.sample_volts.is_finite()
            && self.input_volts > 0.0
            && self.sample_volts > 0.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidCalibration {
                input: self.input_volts,
                sample: self.sample_volts,
            })
        }
    }
}

/// Converter characteristics
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdcSpec {
    /// Full-scale count
    pub max_count: u16,
    /// Reference voltage at full scale (volts)
    pub reference_volts: f32,
}

impl Default for AdcSpec {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_ADC_MAX_COUNT,
            reference_volts: DEFAULT_ADC_REFERENCE_V,
        }
    }
}

impl AdcSpec {
    pub fn volts_per_count(&self) -> f32 {
        self.reference_volts / self.max_count as f32
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_count == 0 || !self.reference_volts.is_finite() || self.reference_volts <= 0.0 {
            return Err(ConfigError::InvalidAdc {
                max_count: self.max_count,
                reference: self.reference_volts,
            });
        }
        Ok(())
    }
}

/// Moving-average battery voltage estimator
///
/// `N` is the filter window in samples. Each `sample()` replaces exactly
/// one slot round-robin and recomputes the mean over the whole window.
pub struct VoltageEstimator<A, const N: usize = DEFAULT_FILTER_WINDOW> {
    source: A,
    window: [u16; N],
    cursor: usize,
    taken: usize,
    max_count: u16,
    /// volts_per_count * ratio, folded once at construction
    scale: f32,
    voltage: f32,
}

impl<A: AnalogSource, const N: usize> VoltageEstimator<A, N> {
    pub fn new(source: A, calibration: Calibration, adc: AdcSpec) -> Self {
        Self {
            source,
            window: [0; N],
            cursor: 0,
            taken: 0,
            max_count: adc.max_count,
            scale: adc.volts_per_count() * calibration.ratio(),
            voltage: 0.0,
        }
    }

    /// Acquire one conversion and return the filtered voltage
    pub fn sample(&mut self) -> f32 {
        let raw = self.source.read_raw().min(self.max_count);
        self.window[self.cursor] = raw;
        self.cursor = (self.cursor + 1) % N;
        if self.taken < N {
            self.taken += 1;
        }

        let sum: u32 = self.window.iter().map(|&r| r as u32).sum();
        let mean = sum as f32 / N as f32;
        self.voltage = mean * self.scale;
        self.voltage
    }

    /// Last filtered voltage, without acquiring
    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    /// Convert a single raw count, bypassing the filter
    pub fn convert(&self, raw: u16) -> f32 {
        raw.min(self.max_count) as f32 * self.scale
    }

    /// True once every slot of the window holds a real sample
    pub fn is_warmed_up(&self) -> bool {
        self.taken >= N
    }

    pub const fn window_len(&self) -> usize {
        N
    }

    /// Access the analog source (for board-level diagnostics)
    pub fn source_mut(&mut self) -> &mut A {
        &mut self.source
    }
}
