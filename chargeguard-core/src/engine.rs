//! Engine-Run Detection by Voltage Perturbation
//!
//! ## Overview
//!
//! There is no tachometer wire. Whether the engine is turning is inferred
//! from how the battery voltage reacts when the output is forced off for a
//! moment:
//!
//! ```text
//! v0 = filtered voltage
//! force output inactive
//! wait settle window (~1 s)
//! v1 = filtered voltage
//! restore previous output command
//! running = (v1 - v0) > rise_threshold
//! ```
//!
//! ## Phases
//!
//! The probe never blocks. It is a small state machine polled from the
//! control loop with the current time and voltage, so sampling and history
//! logging keep running while the battery settles:
//!
//! ```text
//! Idle ──(probe due)──▶ Settling { deadline } ──(now ≥ deadline)──▶ evaluate
//!   ▲                                                              │
//!   └────────────── no rise: wait reprobe interval ◀───────────────┤
//!                                                                  ▼
//!                                                               Running
//! ```
//!
//! `Running` is terminal for the session. Detecting that the engine has
//! stopped again is not attempted.

use crate::constants::{
    charging::DEFAULT_RISE_THRESHOLD_V,
    time::{DEFAULT_SETTLE_WINDOW_MS, DEFAULT_REPROBE_INTERVAL_MS},
};
use crate::errors::{ConfigError, ConfigResult};
use crate::output::{OutputCommand, OutputDriver};
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineProbeConfig {
    /// When false the engine is assumed running from boot
    pub enabled: bool,
    /// Minimum rise across the settle window that counts as running (volts)
    pub rise_threshold: f32,
    pub settle_window_ms: u64,
    /// Pause after a probe that saw no rise
    pub reprobe_interval_ms: u64,
}

impl Default for EngineProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rise_threshold: DEFAULT_RISE_THRESHOLD_V,
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            reprobe_interval_ms: DEFAULT_REPROBE_INTERVAL_MS,
        }
    }
}

impl EngineProbeConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.rise_threshold.is_finite() {
            return Err(ConfigError::NonFiniteParameter { name: "engine.rise_threshold" });
        }
        if self.enabled && self.settle_window_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "engine.settle_window_ms" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbePhase {
    /// Waiting for the next probe to become due
    Idle { next_probe_at: Timestamp },
    /// Output forced off; evaluate once `deadline` passes
    Settling {
        deadline: Timestamp,
        baseline: f32,
        restore: OutputCommand,
    },
    /// Engine detected; the detector is done for this session
    Running,
}

/// Result of one `poll`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeStatus {
    /// No probe in progress and none due yet
    Idle,
    /// A probe started or is still settling; the output is forced off
    Settling,
    /// A probe just finished; the output has been restored
    Completed { running: bool, rise: f32 },
    /// Engine already known to be running
    Running,
}

pub struct EngineRunDetector {
    config: EngineProbeConfig,
    phase: ProbePhase,
    probes: u32,
}

impl EngineRunDetector {
    pub fn new(config: EngineProbeConfig) -> Self {
        let phase = if config.enabled {
            ProbePhase::Idle { next_probe_at: 0 }
        } else {
            ProbePhase::Running
        };
        Self { config, phase, probes: 0 }
    }

    /// Advance the probe with the current time and filtered voltage
    ///
    /// While `Settling` is returned the caller must not command the output.
    pub fn poll<D: OutputDriver + ?Sized>(
        &mut self,
        now: Timestamp,
        voltage: f32,
        driver: &mut D,
    ) -> ProbeStatus {
        match self.phase {
            ProbePhase::Running => ProbeStatus::Running,

            ProbePhase::Idle { next_probe_at } if now >= next_probe_at => {
                let restore = driver.command();
                driver.turn_off();
                self.phase = ProbePhase::Settling {
                    deadline: now.saturating_add(self.config.settle_window_ms),
                    baseline: voltage,
                    restore,
                };
                self.probes = self.probes.saturating_add(1);
                log_debug!("engine probe started at {} V", voltage);
                ProbeStatus::Settling
            }

            ProbePhase::Idle { .. } => ProbeStatus::Idle,

            ProbePhase::Settling { deadline, .. } if now < deadline => ProbeStatus::Settling,

            ProbePhase::Settling { baseline, restore, .. } => {
                driver.apply(restore);
                let running = self.probe(baseline, voltage);
                if !running {
                    self.phase = ProbePhase::Idle {
                        next_probe_at: now.saturating_add(self.config.reprobe_interval_ms),
                    };
                }
                ProbeStatus::Completed { running, rise: voltage - baseline }
            }
        }
    }

    /// Conclude a probe from its two readings and latch the result
    ///
    /// Returns the new `running` value. Once true it stays true.
    pub fn probe(&mut self, v0: f32, v1: f32) -> bool {
        if self.is_running() {
            return true;
        }
        let running = self.evaluate_rise(v0, v1);
        if running {
            self.phase = ProbePhase::Running;
            log_info!("engine running (rise {} V)", v1 - v0);
        } else {
            log_debug!("no engine (rise {} V)", v1 - v0);
        }
        running
    }

    /// Pure decision: did the voltage rise enough across the window?
    pub fn evaluate_rise(&self, v0: f32, v1: f32) -> bool {
        (v1 - v0) > self.config.rise_threshold
    }

    pub fn is_running(&self) -> bool {
        self.phase == ProbePhase::Running
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.phase, ProbePhase::Settling { .. })
    }

    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Number of probes started since boot
    pub fn probe_count(&self) -> u32 {
        self.probes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;

    struct Flag {
        duty: u16,
    }

    impl OutputDriver for Flag {
        fn set_active(&mut self, active: bool) {
            self.duty = active as u16;
        }
        fn set_duty(&mut self, _duty: u16) {}
        fn turn_off(&mut self) {
            self.duty = 0;
        }
        fn is_active(&self) -> bool {
            self.duty > 0
        }
        fn duty(&self) -> u16 {
            self.duty
        }
        fn is_duty_capable(&self) -> bool {
            false
        }
        fn max_duty(&self) -> u16 {
            1
        }
        fn mode(&self) -> OutputMode {
            OutputMode::Relay
        }
    }

    fn config() -> EngineProbeConfig {
        EngineProbeConfig {
            rise_threshold: 1.0,
            settle_window_ms: 1000,
            reprobe_interval_ms: 5000,
            ..EngineProbeConfig::default()
        }
    }

    #[test]
    fn rise_decision() {
        let detector = EngineRunDetector::new(config());
        assert!(detector.evaluate_rise(12.0, 13.5));
        assert!(!detector.evaluate_rise(12.0, 12.8));
        // Threshold itself is not enough
        assert!(!detector.evaluate_rise(12.0, 13.0));
    }

    #[test]
    fn probe_detects_running_engine() {
        let mut driver = Flag { duty: 1 };
        let mut detector = EngineRunDetector::new(config());

        assert_eq!(detector.poll(0, 12.0, &mut driver), ProbeStatus::Settling);
        assert!(!driver.is_active(), "output forced off while settling");
        assert!(detector.is_settling());
        match detector.phase() {
            ProbePhase::Settling { deadline, baseline, .. } => {
                assert_eq!(deadline, 1000);
                assert_eq!(baseline, 12.0);
            }
            other => panic!("expected settling, got {:?}", other),
        }

        assert_eq!(detector.poll(500, 12.9, &mut driver), ProbeStatus::Settling);

        let status = detector.poll(1000, 13.5, &mut driver);
        assert!(matches!(status, ProbeStatus::Completed { running: true, .. }));
        assert!(driver.is_active(), "output restored");
        assert!(detector.is_running());
        assert!(!detector.is_settling());
        assert_eq!(detector.phase(), ProbePhase::Running);

        assert_eq!(detector.poll(2000, 12.0, &mut driver), ProbeStatus::Running);
        assert_eq!(detector.probe_count(), 1);
    }

    #[test]
    fn probe_without_rise_waits_before_retrying() {
        let mut driver = Flag { duty: 0 };
        let mut detector = EngineRunDetector::new(config());

        detector.poll(0, 12.0, &mut driver);
        let status = detector.poll(1000, 12.8, &mut driver);
        assert!(matches!(status, ProbeStatus::Completed { running: false, .. }));
        assert!(!detector.is_running());
        assert_eq!(detector.phase(), ProbePhase::Idle { next_probe_at: 6000 });

        assert_eq!(detector.poll(3000, 12.8, &mut driver), ProbeStatus::Idle);
        assert_eq!(detector.poll(6000, 12.8, &mut driver), ProbeStatus::Settling);
        assert_eq!(detector.probe_count(), 2);
    }

    #[test]
    fn running_latches() {
        let mut detector = EngineRunDetector::new(config());
        assert!(detector.probe(12.0, 13.5));
        assert!(detector.probe(12.0, 12.0));
        assert!(detector.is_running());
    }

    #[test]
    fn disabled_detector_starts_running() {
        let mut driver = Flag { duty: 0 };
        let mut detector = EngineRunDetector::new(EngineProbeConfig {
            enabled: false,
            ..config()
        });
        assert_eq!(detector.poll(0, 0.0, &mut driver), ProbeStatus::Running);
        assert_eq!(detector.probe_count(), 0);
    }
}
