//! Buffer Sizes
//!
//! Both buffers are plain arrays sized at compile time; nothing in the
//! core allocates.

/// Telemetry history capacity (records).
///
/// Fixed by the dashboard contract: 120 records × ~24 bytes ≈ 3 KB.
pub const HISTORY_CAPACITY: usize = 120;

/// Default moving-average window for the voltage estimator (samples).
///
/// Eight 10-bit samples sum comfortably in a `u32`; at 10 Hz the filter
/// settles in under a second.
pub const DEFAULT_FILTER_WINDOW: usize = 8;
