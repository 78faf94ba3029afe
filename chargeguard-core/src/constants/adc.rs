//! ADC and Divider Calibration Defaults
//!
//! The battery is read through a resistive divider:
//!
//! ```text
//! GND -- R1 (100K) -- A0 -- R2 (400K) -- B+
//! ```
//!
//! 15.6 V on B+ lands near 3.1 V on A0, inside the converter range with
//! margin for alternator spikes.

/// Full-scale count of a 10-bit converter.
pub const DEFAULT_ADC_MAX_COUNT: u16 = 1023;

/// Converter reference voltage (volts).
pub const DEFAULT_ADC_REFERENCE_V: f32 = 3.3;

/// Battery voltage measured with a voltmeter during calibration (volts).
pub const DEFAULT_CALIBRATION_INPUT_V: f32 = 15.25;

/// Voltage the board read on A0 at the same moment (volts).
pub const DEFAULT_CALIBRATION_SAMPLE_V: f32 = 2.90;
