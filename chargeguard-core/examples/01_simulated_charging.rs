//! Simulated Charging Example
//!
//! Runs the charge-control core against a simulated battery and alternator,
//! first with a relay and hysteresis, then with a PWM field driver and PID.
//!
//! ## What You'll Learn
//!
//! - Building a `SystemConfig` and a `ControllerContext`
//! - Wiring an ADC channel and output pins through `embedded-hal` traits
//! - Driving the cooperative loop with `tick(now)`
//! - Reading the status report and the history ring
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_simulated_charging
//! ```

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use chargeguard_core::{
    constants::charging::DEFAULT_MAX_DUTY,
    context::ControllerContext,
    controller::ControlStrategy,
    output::{OutputDriver, PwmDriver, RelayDriver},
    time::{MonotonicTime, TimeSource},
    AnalogSource, ConfigResult, SystemConfig,
};
use embedded_hal::{digital, pwm};

/// Battery terminal voltage shared between the simulation and the "ADC"
#[derive(Clone)]
struct DividerAdc {
    volts: Rc<Cell<f32>>,
}

impl AnalogSource for DividerAdc {
    fn read_raw(&mut self) -> u16 {
        // Default calibration: 15.25 V at the battery reads 2.90 V at the pin
        let pin_volts = self.volts.get() * 2.90 / 15.25;
        (pin_volts / 3.3 * 1023.0).round().clamp(0.0, 1023.0) as u16
    }
}

struct SimPin;

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl digital::OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct SimPwm;

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl pwm::SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        DEFAULT_MAX_DUTY
    }
    fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Lead-acid battery with an alternator that starts turning at `engine_start_ms`
struct Vehicle {
    volts: Rc<Cell<f32>>,
    engine_start_ms: u64,
}

impl Vehicle {
    fn step(&self, now: u64, field: f32) {
        let engine = now >= self.engine_start_ms;
        let target = match (engine, field > 0.0) {
            (false, _) => 12.0,
            (true, false) => 13.8, // residual magnetism
            (true, true) => 13.8 + 1.6 * field,
        };
        let v = self.volts.get();
        self.volts.set(v + (target - v) * 0.2);
    }
}

fn run<D: OutputDriver>(title: &str, driver: D, config: &SystemConfig) -> ConfigResult<()> {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));

    // Starts after the first probe, so the detector has to retry
    let volts = Rc::new(Cell::new(12.0));
    let vehicle = Vehicle { volts: volts.clone(), engine_start_ms: 6_500 };
    let adc = DividerAdc { volts };

    let mut ctx: ControllerContext<_, _> = ControllerContext::new(adc, driver, config)?;
    let mut clock = MonotonicTime::new();

    for _ in 0..600 {
        let now = clock.now();
        ctx.tick(now);

        let field = ctx.driver().duty() as f32 / ctx.driver().max_duty() as f32;
        vehicle.step(now, field);

        if now % 5_000 == 0 {
            let status = ctx.status();
            println!(
                "  t={:6}ms  {:5.2} V  engine={:<5}  output={:<5}  duty={:3}%",
                now, status.voltage, status.engine_running, status.output_active, status.duty_percent
            );
        }
        clock.advance(100);
    }

    let history = ctx.history();
    println!("\nHistory: {} records, newest last", history.len());
    for record in history.snapshot().skip(history.len().saturating_sub(5)) {
        println!(
            "  t={:6}ms  {:5.2} V  {}  duty={}",
            record.timestamp,
            record.voltage,
            record.mode.name(),
            record.duty
        );
    }

    #[cfg(feature = "serde")]
    {
        let json = serde_json::to_string(&ctx.status()).unwrap_or_default();
        println!("\nStatus JSON: {}", json);
    }

    println!();
    Ok(())
}

fn main() -> ConfigResult<()> {
    let config = SystemConfig::default();
    run("Relay with hysteresis", RelayDriver::new(SimPin, false), &config)?;

    let mut config = SystemConfig::default();
    config.controller.strategy = ControlStrategy::Pid;
    run("PWM with PID", PwmDriver::new(SimPwm, false)?, &config)?;

    // PID needs a variable-duty output
    let attempt: ConfigResult<ControllerContext<DividerAdc, RelayDriver<SimPin>>> =
        ControllerContext::new(
            DividerAdc { volts: Rc::new(Cell::new(12.0)) },
            RelayDriver::new(SimPin, false),
            &config,
        );
    match attempt {
        Ok(_) => println!("unexpected: PID accepted on a relay"),
        Err(err) => println!("Rejected as expected: {}", err),
    }

    Ok(())
}
