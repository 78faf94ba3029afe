//! The control loop context
//!
//! ## Overview
//!
//! `ControllerContext` owns every piece of core state: the estimator and
//! its ADC channel, the output driver, the charge controller, the engine
//! detector, the history ring and the status LED. The board's main loop
//! owns the context and calls `tick(now)` as often as it likes; software
//! timers inside decide what actually runs.
//!
//! ## One tick
//!
//! ```text
//! control timer due?
//!   ├─ sample voltage                      (VoltageEstimator)
//!   ├─ window still filling? → stop here
//!   ├─ poll engine probe                   (EngineRunDetector)
//!   │    └─ engine running? → evaluate     (ChargeController → OutputDriver)
//!   └─ update status LED
//! history timer due?
//!   └─ append snapshot                     (TelemetryRingBuffer)
//! ```
//!
//! Nothing in a tick blocks. While an engine probe is settling the
//! controller is skipped and the probe owns the output, but sampling and
//! history logging carry on.
//!
//! ## Example
//!
//! ```rust
//! use chargeguard_core::{
//!     config::SystemConfig,
//!     context::ControllerContext,
//!     output::RelayDriver,
//!     traits::AnalogFn,
//! };
//! # use embedded_hal::digital::{ErrorType, OutputPin};
//! # struct Pin;
//! # impl ErrorType for Pin { type Error = core::convert::Infallible; }
//! # impl OutputPin for Pin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! let mut config = SystemConfig::default();
//! config.engine.enabled = false;
//!
//! let adc = AnalogFn(|| 800); // ~13.6 V through the default divider
//! let relay = RelayDriver::new(Pin, false);
//! let mut ctx: ControllerContext<_, _> = ControllerContext::new(adc, relay, &config).unwrap();
//!
//! for now in (0..2_000).step_by(100) {
//!     ctx.tick(now);
//! }
//! assert!(ctx.status().output_active);
//! ```

use embedded_hal::digital::OutputPin;

use crate::config::SystemConfig;
use crate::constants::buffers::{DEFAULT_FILTER_WINDOW, HISTORY_CAPACITY};
use crate::controller::{ChargeController, ControlAction, ControlStrategy};
use crate::engine::{EngineRunDetector, ProbeStatus};
use crate::errors::{ConfigError, ConfigResult};
use crate::estimator::VoltageEstimator;
use crate::indicator::{NoLed, StatusIndicator};
use crate::output::OutputDriver;
use crate::telemetry::{round_centivolts, HistoryRecord, StatusReport, TelemetryRingBuffer};
use crate::time::{SoftTimer, Timestamp};
use crate::traits::AnalogSource;

/// What a call to `tick` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Filtered voltage, if the control timer fired
    pub voltage: Option<f32>,
    /// Engine probe progress, if the control timer fired on a full window
    pub probe: Option<ProbeStatus>,
    /// Controller outcome; `Held` when it did not run
    pub action: ControlAction,
    /// Whether a history record was appended
    pub logged: bool,
}

impl TickReport {
    const IDLE: Self = Self {
        voltage: None,
        probe: None,
        action: ControlAction::Held,
        logged: false,
    };
}

pub struct ControllerContext<
    A,
    D,
    L = NoLed,
    const W: usize = DEFAULT_FILTER_WINDOW,
    const H: usize = HISTORY_CAPACITY,
> {
    estimator: VoltageEstimator<A, W>,
    driver: D,
    controller: ChargeController,
    engine: EngineRunDetector,
    history: TelemetryRingBuffer<H>,
    indicator: Option<StatusIndicator<L>>,
    control_timer: SoftTimer,
    history_timer: SoftTimer,
    last_tick: Timestamp,
}

impl<A, D, const W: usize, const H: usize> ControllerContext<A, D, NoLed, W, H>
where
    A: AnalogSource,
    D: OutputDriver,
{
    /// Validate `config` and assemble the core around an ADC channel and a driver
    ///
    /// The driver is turned off before the first tick.
    pub fn new(source: A, mut driver: D, config: &SystemConfig) -> ConfigResult<Self> {
        if let Err(err) = config.validate() {
            log_warn!("configuration rejected: {}", err.kind());
            return Err(err);
        }
        if config.controller.strategy == ControlStrategy::Pid && !driver.is_duty_capable() {
            log_warn!("configuration rejected: {}", ConfigError::DutyControlUnsupported.kind());
            return Err(ConfigError::DutyControlUnsupported);
        }

        driver.turn_off();
        log_info!(
            "charge control ready: {} on {} output",
            config.controller.strategy.name(),
            driver.mode().name()
        );

        Ok(Self {
            estimator: VoltageEstimator::new(source, config.calibration, config.adc),
            controller: ChargeController::new(config.controller, driver.max_duty()),
            driver,
            engine: EngineRunDetector::new(config.engine),
            history: TelemetryRingBuffer::new(),
            indicator: None,
            control_timer: SoftTimer::new(config.schedule.control_interval_ms),
            history_timer: SoftTimer::new(config.schedule.history_interval_ms),
            last_tick: 0,
        })
    }

    /// Attach a status LED
    pub fn with_indicator<P: OutputPin>(self, led: P, active_low: bool) -> ControllerContext<A, D, P, W, H> {
        ControllerContext {
            estimator: self.estimator,
            driver: self.driver,
            controller: self.controller,
            engine: self.engine,
            history: self.history,
            indicator: Some(StatusIndicator::new(led, active_low)),
            control_timer: self.control_timer,
            history_timer: self.history_timer,
            last_tick: self.last_tick,
        }
    }
}

impl<A, D, L, const W: usize, const H: usize> ControllerContext<A, D, L, W, H>
where
    A: AnalogSource,
    D: OutputDriver,
    L: OutputPin,
{
    /// Run whatever periodic work is due at `now`
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        self.last_tick = now;
        let mut report = TickReport::IDLE;

        if self.control_timer.fire(now) {
            let voltage = self.estimator.sample();
            report.voltage = Some(voltage);

            // A partly filled window reads low; neither a probe baseline
            // nor a charge decision may be taken from it
            if self.estimator.is_warmed_up() {
                let probe = self.engine.poll(now, voltage, &mut self.driver);
                let engine_running = match probe {
                    ProbeStatus::Running => true,
                    ProbeStatus::Completed { running, .. } => running,
                    ProbeStatus::Idle | ProbeStatus::Settling => false,
                };
                if engine_running {
                    report.action = self.controller.evaluate(voltage, now, &mut self.driver);
                }
                report.probe = Some(probe);
            }

            if let Some(indicator) = self.indicator.as_mut() {
                indicator.update(self.driver.is_active());
            }
        }

        if self.history_timer.fire(now) {
            let record = self.record(now);
            self.history.append(record);
            report.logged = true;
        }

        report
    }

    fn record(&self, now: Timestamp) -> HistoryRecord {
        HistoryRecord {
            timestamp: now,
            voltage: self.estimator.voltage(),
            output_active: self.driver.is_active(),
            duty: self.driver.duty(),
            mode: self.driver.mode(),
            engine_running: self.engine.is_running(),
        }
    }

    /// Current values for the dashboard
    pub fn status(&self) -> StatusReport {
        StatusReport {
            voltage: round_centivolts(self.estimator.voltage()),
            mode: self.driver.mode(),
            output_active: self.driver.is_active(),
            duty: self.driver.duty(),
            duty_percent: self.driver.duty_percent(),
            engine_running: self.engine.is_running(),
            uptime_ms: self.last_tick,
        }
    }

    /// Last filtered voltage, unrounded
    pub fn voltage(&self) -> f32 {
        self.estimator.voltage()
    }

    pub fn is_engine_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn history(&self) -> &TelemetryRingBuffer<H> {
        &self.history
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn controller(&self) -> &ChargeController {
        &self.controller
    }

    pub fn engine(&self) -> &EngineRunDetector {
        &self.engine
    }

    pub fn estimator(&self) -> &VoltageEstimator<A, W> {
        &self.estimator
    }

    pub fn indicator(&self) -> Option<&StatusIndicator<L>> {
        self.indicator.as_ref()
    }

    /// Switch the output off and restart the controller from `Inactive`
    ///
    /// History and engine state are kept.
    pub fn stop(&mut self) {
        self.controller.reset(&mut self.driver);
        log_info!("charge control stopped at t={}", self.last_tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputMode;
    use crate::traits::AnalogFn;
    use core::cell::Cell;

    struct Relay {
        on: bool,
    }

    impl OutputDriver for Relay {
        fn set_active(&mut self, active: bool) {
            self.on = active;
        }
        fn set_duty(&mut self, _duty: u16) {}
        fn turn_off(&mut self) {
            self.on = false;
        }
        fn is_active(&self) -> bool {
            self.on
        }
        fn duty(&self) -> u16 {
            self.on as u16
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

    fn config_without_probe() -> SystemConfig {
        let mut config = SystemConfig::default();
        config.engine.enabled = false;
        config
    }

    #[test]
    fn pid_on_relay_is_rejected() {
        let mut config = config_without_probe();
        config.controller.strategy = ControlStrategy::Pid;

        let result: ConfigResult<ControllerContext<_, _>> =
            ControllerContext::new(AnalogFn(|| 0), Relay { on: true }, &config);
        assert!(matches!(result, Err(ConfigError::DutyControlUnsupported)));
    }

    #[test]
    fn construction_turns_output_off() {
        let ctx: ControllerContext<_, _> =
            ControllerContext::new(AnalogFn(|| 0), Relay { on: true }, &config_without_probe())
                .unwrap();
        assert!(!ctx.driver().is_active());
    }

    #[test]
    fn control_runs_on_its_own_cadence() {
        let reads = Cell::new(0u32);
        let source = AnalogFn(|| {
            reads.set(reads.get() + 1);
            800
        });
        let mut ctx: ControllerContext<_, _> =
            ControllerContext::new(source, Relay { on: false }, &config_without_probe()).unwrap();

        for now in 0..1000 {
            ctx.tick(now);
        }
        // 100 ms control interval over 1 s
        assert_eq!(reads.get(), 10);
        // 500 ms history interval; the t=0 record is invisible
        assert_eq!(ctx.history().write_count(), 2);
        assert_eq!(ctx.history().snapshot().count(), 1);
    }

    #[test]
    fn controller_waits_for_engine() {
        let mut ctx: ControllerContext<_, _> = ControllerContext::new(
            AnalogFn(|| 700),
            Relay { on: false },
            &SystemConfig::default(),
        )
        .unwrap();

        // Nothing happens while the filter window fills
        for now in (0..700).step_by(100) {
            let report = ctx.tick(now);
            assert!(report.voltage.is_some());
            assert_eq!(report.probe, None);
        }

        // Eighth sample fills the window and starts a probe instead of charging
        let report = ctx.tick(700);
        assert_eq!(report.probe, Some(ProbeStatus::Settling));
        assert_eq!(report.action, ControlAction::Held);
        assert!(!ctx.driver().is_active());
    }

    #[test]
    fn status_reports_rounded_voltage() {
        let mut ctx: ControllerContext<_, _, NoLed, 1> =
            ControllerContext::new(AnalogFn(|| 800), Relay { on: false }, &config_without_probe())
                .unwrap();
        ctx.tick(100);

        let status = ctx.status();
        assert_eq!(status.voltage, round_centivolts(ctx.voltage()));
        assert_eq!(status.mode, OutputMode::Relay);
        assert_eq!(status.uptime_ms, 100);
        assert!(status.engine_running);
    }

    #[test]
    fn indicator_follows_output() {
        let ctx: ControllerContext<_, _> =
            ControllerContext::new(AnalogFn(|| 800), Relay { on: false }, &config_without_probe())
                .unwrap();
        let mut ctx = ctx.with_indicator(NoLed, false);

        // ~13.6 V is below `low`: relay closes once the window is full
        ctx.tick(0);
        assert!(!ctx.driver().is_active());
        for now in (100..=700).step_by(100) {
            ctx.tick(now);
        }
        assert!(ctx.driver().is_active());
        assert!(ctx.indicator().map_or(false, |led| led.is_lit()));

        ctx.stop();
        assert!(!ctx.driver().is_active());
    }
}
