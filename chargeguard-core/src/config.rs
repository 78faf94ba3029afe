//! Startup configuration
//!
//! Everything the bootstrap collaborator hands the core, in one struct.
//! Values are checked once by [`SystemConfig::validate`]; after that the
//! core assumes them valid and never re-checks in the control loop.
//!
//! With the `serde` feature the whole tree deserializes from JSON, and
//! missing fields fall back to the defaults in [`constants`](crate::constants):
//!
//! ```rust
//! # #[cfg(feature = "serde")] {
//! use chargeguard_core::config::SystemConfig;
//! use chargeguard_core::controller::ControlStrategy;
//!
//! let config: SystemConfig = serde_json::from_str(
//!     r#"{ "controller": { "strategy": "pid", "setpoint": 14.2 } }"#,
//! ).unwrap();
//!
//! assert_eq!(config.controller.strategy, ControlStrategy::Pid);
//! assert_eq!(config.controller.high, 14.8);
//! assert!(config.validate().is_ok());
//! # }
//! ```

use crate::constants::time::{DEFAULT_HISTORY_INTERVAL_MS, DEFAULT_SAMPLE_INTERVAL_MS};
use crate::controller::{ControlStrategy, ControllerConfig};
use crate::engine::EngineProbeConfig;
use crate::errors::{ConfigError, ConfigResult};
use crate::estimator::{AdcSpec, Calibration};

/// Cadence of the cooperative loop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScheduleConfig {
    /// Sample voltage, poll the engine probe and run the controller
    pub control_interval_ms: u64,
    /// Append a history record
    pub history_interval_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            control_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            history_interval_ms: DEFAULT_HISTORY_INTERVAL_MS,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.control_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "schedule.control_interval_ms" });
        }
        if self.history_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "schedule.history_interval_ms" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SystemConfig {
    pub calibration: Calibration,
    pub adc: AdcSpec,
    pub controller: ControllerConfig,
    pub engine: EngineProbeConfig,
    pub schedule: ScheduleConfig,
}

impl SystemConfig {
    /// Check every section, then how they fit together; the first
    /// violation wins
    pub fn validate(&self) -> ConfigResult<()> {
        self.calibration.validate()?;
        self.adc.validate()?;
        self.controller.validate()?;
        self.engine.validate()?;
        self.schedule.validate()?;

        // The PID only gets a chance to run on control ticks
        if self.controller.strategy == ControlStrategy::Pid
            && self.schedule.control_interval_ms > self.controller.sample_interval_ms
        {
            return Err(ConfigError::ControlSlowerThanPid {
                control_interval_ms: self.schedule.control_interval_ms,
                sample_interval_ms: self.controller.sample_interval_ms,
            });
        }
        Ok(())
    }
}
