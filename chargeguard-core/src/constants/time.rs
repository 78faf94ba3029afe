//! Time-Related Constants
//!
//! All scheduling in the core compares a monotonic millisecond counter
//! against deadlines; nothing sleeps except the board's outer loop.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== SCHEDULING =====

/// Voltage sampling and control evaluation interval (milliseconds).
///
/// 10 Hz keeps the moving average fresh without loading the ADC.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// History logging interval (milliseconds).
///
/// 120 slots at 500 ms cover the last minute, matching the dashboard chart.
pub const DEFAULT_HISTORY_INTERVAL_MS: u64 = 500;

// ===== ENGINE PROBE =====

/// Time the battery is left without charge current during a probe
/// (milliseconds).
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 1000;

/// Pause between unsuccessful probes (milliseconds).
pub const DEFAULT_REPROBE_INTERVAL_MS: u64 = 5000;
