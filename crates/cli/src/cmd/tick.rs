//! Repeating timer demo
//!
//! Prints one JSON line per tick. The tick before the last clears the repeat
//! flag, so the final tick stops the timer on its own.

use super::{as_millis, print_json, CallbackFailure, Driver, TickRecord};
use anyhow::Result;
use lull_core::{LullConfig, RepeatingTimer, Stopwatch};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

pub async fn run(
    config: &LullConfig,
    period_ms: Option<u64>,
    count: u32,
    virtual_time: bool,
) -> Result<()> {
    if count == 0 {
        anyhow::bail!("--count must be at least 1");
    }
    let period = Duration::from_millis(period_ms.unwrap_or(config.timer.period_ms));
    if period.is_zero() {
        anyhow::bail!("--period-ms must be greater than zero");
    }

    let driver = Driver::new(virtual_time);
    let stopwatch = Stopwatch::new(driver.clock(), true);
    let done = Rc::new(Notify::new());
    let ticks = Rc::new(Cell::new(0u32));
    let failure = CallbackFailure::default();

    let timer = {
        let done = Rc::clone(&done);
        let ticks = Rc::clone(&ticks);
        let failure = failure.clone();
        RepeatingTimer::new(driver.timers(), period).with_tick(move |timer| {
            let tick = ticks.get() + 1;
            ticks.set(tick);
            let record = TickRecord {
                tick,
                at_ms: as_millis(stopwatch.elapsed()),
            };
            if let Err(e) = print_json(&record) {
                failure.set(e);
                timer.stop();
                done.notify_one();
                return;
            }

            if tick + 1 == count {
                timer.set_repeat(false);
            }
            if !timer.is_enabled() {
                done.notify_one();
            }
        })
    };

    if count == 1 {
        timer.set_repeat(false);
    }
    info!("Ticking every {:?}, {} time(s)", period, count);
    timer.start();

    match &driver {
        Driver::Virtual(clock) => {
            while timer.is_enabled() {
                clock.advance(period);
            }
        }
        Driver::Tokio(platform) => platform.run_until(done.notified()).await,
    }

    info!("Timer stopped after {} tick(s)", ticks.get());
    failure.into_result()
}
