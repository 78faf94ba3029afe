//! Error Types for Startup Configuration
//!
//! ## Design Philosophy
//!
//! The control cycle itself has no recoverable error paths: ADC reads always
//! return an in-range count and actuator writes are fire-and-forget. The only
//! place the core can say "no" is at startup, when the bootstrap collaborator
//! hands over calibration constants, thresholds and gains.
//!
//! Errors follow the same embedded constraints as the rest of the crate:
//!
//! 1. **Small Size**: every variant is a few scalars or a `&'static str`.
//! 2. **No Heap Allocation**: no `String`, ever.
//! 3. **Copy Semantics**: errors can be returned, stored and compared freely.
//!
//! ## Error Categories
//!
//! - `InvalidThresholds`: the hysteresis band is empty or inverted
//! - `InvalidCalibration`: the divider ratio would be zero, negative or NaN
//! - `InvalidAdc`: the converter has no resolution or no reference
//! - `InvalidSetpoint`: the PID setpoint sits outside the safety band
//! - `NonFiniteParameter`: a gain or threshold is NaN or infinite
//! - `ZeroInterval`: a scheduling interval of 0 ms
//! - `ControlSlowerThanPid`: the loop ticks less often than the PID wants to run
//! - `ZeroMaxDuty`: a PWM channel with no resolution
//! - `DutyControlUnsupported`: PID requested on a relay
//!
//! ```rust
//! use chargeguard_core::{config::SystemConfig, errors::ConfigError};
//!
//! let mut config = SystemConfig::default();
//! config.controller.low = 15.0; // above `high`
//!
//! match config.validate() {
//!     Err(ConfigError::InvalidThresholds { low, high }) => {
//!         assert!(low >= high);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors - detected once at startup
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `low` must be strictly below `high`
    #[error("Invalid thresholds: low {low} V must be below high {high} V")]
    InvalidThresholds {
        /// Activation threshold in volts
        low: f32,
        /// Deactivation threshold in volts
        high: f32,
    },

    /// Calibration voltages must both be positive
    #[error("Invalid calibration: input {input} V, sample {sample} V")]
    InvalidCalibration {
        /// Battery voltage measured with a voltmeter
        input: f32,
        /// Voltage seen on the ADC pin at the same moment
        sample: f32,
    },

    /// Converter needs a non-zero full scale and a positive reference
    #[error("Invalid ADC: max count {max_count}, reference {reference} V")]
    InvalidAdc {
        /// Full-scale count
        max_count: u16,
        /// Reference voltage
        reference: f32,
    },

    /// PID setpoint must fall inside the open band `(low, high)`
    #[error("Setpoint {setpoint} V outside ({low}, {high})")]
    InvalidSetpoint {
        /// Requested regulation target
        setpoint: f32,
        /// Lower safety clamp
        low: f32,
        /// Upper safety clamp
        high: f32,
    },

    /// A parameter is NaN or infinite
    #[error("Parameter {name} is not a finite number")]
    NonFiniteParameter {
        name: &'static str,
    },

    /// A scheduling interval or window of zero milliseconds
    #[error("Interval {name} must be non-zero")]
    ZeroInterval {
        name: &'static str,
    },

    /// The PID can only run on control ticks, so those must come at least
    /// as often as its own interval
    #[error("Control interval {control_interval_ms} ms is longer than PID interval {sample_interval_ms} ms")]
    ControlSlowerThanPid {
        control_interval_ms: u64,
        sample_interval_ms: u64,
    },

    /// The output channel reports no duty resolution
    #[error("Maximum duty must be greater than zero")]
    ZeroMaxDuty,

    /// The PID strategy needs a variable-duty output
    #[error("PID control requires a duty-capable output driver")]
    DutyControlUnsupported,
}

impl ConfigError {
    /// Short machine-friendly tag, usable from both logging backends
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidThresholds { .. } => "invalid_thresholds",
            Self::InvalidCalibration { .. } => "invalid_calibration",
            Self::InvalidAdc { .. } => "invalid_adc",
            Self::InvalidSetpoint { .. } => "invalid_setpoint",
            Self::NonFiniteParameter { .. } => "non_finite_parameter",
            Self::ZeroInterval { .. } => "zero_interval",
            Self::ControlSlowerThanPid { .. } => "control_slower_than_pid",
            Self::ZeroMaxDuty => "zero_max_duty",
            Self::DutyControlUnsupported => "duty_control_unsupported",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidThresholds { low, high } =>
                defmt::write!(fmt, "low {} >= high {}", low, high),
            Self::InvalidCalibration { input, sample } =>
                defmt::write!(fmt, "calibration {} / {}", input, sample),
            Self::InvalidAdc { max_count, reference } =>
                defmt::write!(fmt, "adc {} counts / {} V", max_count, reference),
            Self::InvalidSetpoint { setpoint, low, high } =>
                defmt::write!(fmt, "setpoint {} outside ({}, {})", setpoint, low, high),
            Self::NonFiniteParameter { name } =>
                defmt::write!(fmt, "{} not finite", name),
            Self::ZeroInterval { name } =>
                defmt::write!(fmt, "{} is zero", name),
            Self::ControlSlowerThanPid { control_interval_ms, sample_interval_ms } =>
                defmt::write!(fmt, "control {} ms > pid {} ms", control_interval_ms, sample_interval_ms),
            Self::ZeroMaxDuty =>
                defmt::write!(fmt, "max duty is zero"),
            Self::DutyControlUnsupported =>
                defmt::write!(fmt, "PID on relay output"),
        }
    }
}
