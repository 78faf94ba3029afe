//! Charge Band and Control Tuning
//!
//! Defaults for a 12 V flooded lead-acid battery charged by a tractor
//! alternator. The band brackets the usual absorption voltage
//! (14.4 V at 25 °C).

// ===== HYSTERESIS BAND =====

/// Upper threshold (volts).
///
/// Above this the output is cut immediately, in both strategies.
/// Gassing accelerates past ~14.8 V on flooded cells.
pub const DEFAULT_HIGH_THRESHOLD_V: f32 = 14.8;

/// Lower threshold (volts).
///
/// Below this the hysteresis strategy re-activates the output and the
/// PID strategy forces full duty.
pub const DEFAULT_LOW_THRESHOLD_V: f32 = 14.0;

/// Minimum dwell after a transition before the output may be
/// re-activated (milliseconds).
pub const DEFAULT_LOCKOUT_MS: u64 = 2000;

// ===== PID =====

/// Regulation target for the PID strategy (volts).
pub const DEFAULT_SETPOINT_V: f32 = 14.4;

/// Proportional gain (duty counts per volt of error).
pub const DEFAULT_KP: f32 = 400.0;

/// Integral gain (duty counts per volt-second).
pub const DEFAULT_KI: f32 = 40.0;

/// Derivative gain (duty counts per volt/second).
pub const DEFAULT_KD: f32 = 5.0;

/// Slew divisor: the commanded duty may move at most
/// `max_duty / SLEW_DIVISOR` counts per PID evaluation.
pub const SLEW_DIVISOR: u16 = 10;

// ===== OUTPUT =====

/// Duty scale of a 10-bit PWM channel driving the MOSFET gate.
pub const DEFAULT_MAX_DUTY: u16 = 1023;

// ===== ENGINE DETECTION =====

/// Voltage rise that marks a turning alternator (volts).
///
/// A resting battery moves a few hundred millivolts when the load
/// changes; a charging alternator moves it by well over a volt.
pub const DEFAULT_RISE_THRESHOLD_V: f32 = 1.0;
