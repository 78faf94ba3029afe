//! Fixed-Capacity Telemetry History
//!
//! ## Overview
//!
//! A ring of 120 `HistoryRecord`s that the dashboard reads to draw the
//! voltage chart. Like everything else in the core it has a fixed size
//! decided at compile time and never allocates.
//!
//! ## Slot semantics
//!
//! Slots are plain records rather than `Option`s: a slot whose
//! `timestamp == 0` has never been written and readers skip it. After `k`
//! appends the write cursor sits at `k mod N`; the slot just before the
//! cursor holds the newest record, which replaced whatever was written
//! `N` appends earlier.
//!
//! ```text
//! N = 5, after 7 appends (write_count = 7, cursor = 2)
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  #5 │  #6 │  #2 │  #3 │  #4 │   ← append number held in each slot
//! └─────┴─────┴─────┴─────┴─────┘
//!              ↑
//!           cursor: oldest surviving record, next slot to overwrite
//! ```
//!
//! ## Snapshots
//!
//! `snapshot()` borrows the buffer and yields records oldest-first. The
//! iterator is `Clone`, so a consumer can walk it twice (e.g. once to
//! size a response, once to write it) without copying the data.

use crate::constants::buffers::HISTORY_CAPACITY;
use crate::output::OutputMode;
use crate::time::Timestamp;

/// One logged sample of the control loop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HistoryRecord {
    /// Milliseconds since boot; 0 marks a slot that was never written
    pub timestamp: Timestamp,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_volts"))]
    pub voltage: f32,
    pub output_active: bool,
    pub duty: u16,
    pub mode: OutputMode,
    pub engine_running: bool,
}

impl HistoryRecord {
    pub const EMPTY: Self = Self {
        timestamp: 0,
        voltage: 0.0,
        output_active: false,
        duty: 0,
        mode: OutputMode::Relay,
        engine_running: false,
    };

    pub fn is_written(&self) -> bool {
        self.timestamp != 0
    }
}

/// Round to two decimals, the precision dashboards display
pub fn round_centivolts(volts: f32) -> f32 {
    libm::roundf(volts * 100.0) / 100.0
}

#[cfg(feature = "serde")]
fn serialize_volts<S: serde::Serializer>(volts: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f32(round_centivolts(*volts))
}

/// Ring buffer of history records
pub struct TelemetryRingBuffer<const N: usize = HISTORY_CAPACITY> {
    records: [HistoryRecord; N],
    write_count: u64,
}

impl<const N: usize> TelemetryRingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            records: [HistoryRecord::EMPTY; N],
            write_count: 0,
        }
    }

    /// Store a record, overwriting the oldest once the ring is full
    pub fn append(&mut self, record: HistoryRecord) {
        let idx = self.cursor();
        self.records[idx] = record;
        self.write_count = self.write_count.wrapping_add(1);
    }

    /// Total appends since boot
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Slot the next append will write
    pub fn cursor(&self) -> usize {
        (self.write_count % N as u64) as usize
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of slots that have been written at least once
    pub fn len(&self) -> usize {
        self.write_count.min(N as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.write_count == 0
    }

    /// The most recent record, if any
    pub fn latest(&self) -> Option<&HistoryRecord> {
        if self.write_count == 0 {
            return None;
        }
        let idx = ((self.write_count - 1) % N as u64) as usize;
        Some(&self.records[idx]).filter(|r| r.is_written())
    }

    /// Oldest-first view of the surviving records, skipping unwritten slots
    pub fn snapshot(&self) -> Snapshot<'_, N> {
        let start = self.write_count.saturating_sub(N as u64);
        Snapshot {
            records: &self.records,
            position: start,
            end: self.write_count,
        }
    }

    /// Owned copy of the snapshot for consumers that outlive the borrow
    pub fn collect_snapshot(&self) -> heapless::Vec<HistoryRecord, N> {
        self.snapshot().copied().collect()
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.records = [HistoryRecord::EMPTY; N];
        self.write_count = 0;
    }
}

impl<const N: usize> Default for TelemetryRingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`TelemetryRingBuffer::snapshot`]
#[derive(Clone)]
pub struct Snapshot<'a, const N: usize> {
    records: &'a [HistoryRecord; N],
    position: u64,
    end: u64,
}

impl<'a, const N: usize> Iterator for Snapshot<'a, N> {
    type Item = &'a HistoryRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.end {
            let record = &self.records[(self.position % N as u64) as usize];
            self.position += 1;
            if record.is_written() {
                return Some(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some((self.end - self.position) as usize))
    }
}

/// Current state of the core, as exposed to the dashboard
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StatusReport {
    /// Filtered battery voltage, rounded to two decimals
    pub voltage: f32,
    pub mode: OutputMode,
    pub output_active: bool,
    pub duty: u16,
    pub duty_percent: u8,
    pub engine_running: bool,
    pub uptime_ms: Timestamp,
}
