//! Constants for ChargeGuard Core
//!
//! Centralized numeric defaults for the charge-control subsystem. Every
//! value here is a *default*: the bootstrap collaborator may override it
//! through [`SystemConfig`](crate::config::SystemConfig) at startup.
//!
//! ## Organization
//!
//! - **Charging**: voltage band, lockout, PID gains
//! - **Adc**: converter resolution and calibration defaults
//! - **Time**: unit conversions and scheduling intervals
//! - **Buffers**: history capacity and filter window
//!
//! Names carry their units (`_V`, `_MS`).

/// Charge band, lockout and PID tuning defaults.
pub mod charging;

/// ADC resolution and divider calibration defaults.
pub mod adc;

/// Time-related constants for intervals and windows.
pub mod time;

/// Buffer sizes for history and filtering.
pub mod buffers;

// Re-export commonly used constants for convenience
pub use charging::{
    DEFAULT_HIGH_THRESHOLD_V, DEFAULT_LOW_THRESHOLD_V, DEFAULT_SETPOINT_V,
    DEFAULT_LOCKOUT_MS, DEFAULT_RISE_THRESHOLD_V, SLEW_DIVISOR,
};

pub use adc::{
    DEFAULT_ADC_MAX_COUNT, DEFAULT_ADC_REFERENCE_V,
    DEFAULT_CALIBRATION_INPUT_V, DEFAULT_CALIBRATION_SAMPLE_V,
};

pub use time::{
    MS_PER_SECOND, DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_HISTORY_INTERVAL_MS,
    DEFAULT_SETTLE_WINDOW_MS, DEFAULT_REPROBE_INTERVAL_MS,
};

pub use buffers::{HISTORY_CAPACITY, DEFAULT_FILTER_WINDOW};
