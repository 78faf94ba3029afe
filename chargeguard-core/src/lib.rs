//! Charge-control core for ChargeGuard
//!
//! Regulates a vehicle alternator's field output from the filtered battery
//! voltage, either by switching a relay or by driving a PWM duty cycle.
//! Designed for small microcontrollers.
//!
//! Key constraints:
//! - No heap allocation anywhere in the core
//! - Nothing blocks: one cooperative `tick(now)` drives every periodic task
//! - Hardware reached only through `embedded-hal` traits and [`AnalogSource`]
//!
//! ```no_run
//! use chargeguard_core::{ControllerContext, RelayDriver, SystemConfig, traits::AnalogFn};
//! # use embedded_hal::digital::{ErrorType, OutputPin};
//! # struct Pin;
//! # impl ErrorType for Pin { type Error = core::convert::Infallible; }
//! # impl OutputPin for Pin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # fn read_adc() -> u16 { 0 }
//! # fn millis() -> u64 { 0 }
//!
//! let config = SystemConfig::default();
//! let mut ctx: ControllerContext<_, _> =
//!     ControllerContext::new(AnalogFn(read_adc), RelayDriver::new(Pin, true), &config).unwrap();
//!
//! loop {
//!     ctx.tick(millis());
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod engine;
pub mod errors;
pub mod estimator;
pub mod indicator;
pub mod output;
pub mod pid;
pub mod telemetry;
pub mod time;
pub mod traits;

// Public API
pub use config::SystemConfig;
pub use context::{ControllerContext, TickReport};
pub use controller::{ChargeController, ChargeState, ControlAction, ControlStrategy, ControllerConfig};
pub use engine::{EngineProbeConfig, EngineRunDetector, ProbeStatus};
pub use errors::{ConfigError, ConfigResult};
pub use estimator::{AdcSpec, Calibration, VoltageEstimator};
pub use output::{OutputDriver, OutputMode, PwmDriver, RelayDriver};
pub use telemetry::{HistoryRecord, StatusReport, TelemetryRingBuffer};
pub use time::{SoftTimer, TimeSource, Timestamp};
pub use traits::AnalogSource;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
