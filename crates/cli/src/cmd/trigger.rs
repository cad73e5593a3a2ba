//! Trigger collector demo
//!
//! Calls `trigger` at each requested offset and prints every delivered batch
//! as a JSON line.

use super::{as_millis, print_json, BatchRecord, CallbackFailure, Driver};
use anyhow::Result;
use lull_core::{LullConfig, Stopwatch};
use lull_debounce::DebouncedTriggerCollector;
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tracing::info;

/// Arguments of one `trigger` call
#[derive(Debug, Clone, Serialize)]
struct TriggerCall {
    index: usize,
    offset_ms: u64,
}

pub async fn run(
    config: &LullConfig,
    delay_ms: Option<u64>,
    mut offsets: Vec<u64>,
    disabled: bool,
    virtual_time: bool,
) -> Result<()> {
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.debounce.delay_ms));
    if delay.is_zero() {
        anyhow::bail!("--delay-ms must be greater than zero");
    }
    offsets.sort_unstable();

    let driver = Driver::new(virtual_time);
    let stopwatch = Stopwatch::new(driver.clock(), true);
    let deliveries = Rc::new(Cell::new(0usize));
    let settled = Rc::new(Notify::new());
    let failure = CallbackFailure::default();

    let collector = {
        let deliveries = Rc::clone(&deliveries);
        let settled = Rc::clone(&settled);
        let failure = failure.clone();
        let on_batch = move |collector: &DebouncedTriggerCollector<TriggerCall>,
                             calls: Vec<TriggerCall>| {
            deliveries.set(deliveries.get() + 1);
            let record = BatchRecord {
                at_ms: as_millis(stopwatch.elapsed()),
                batch: calls,
            };
            if let Err(e) = print_json(&record) {
                failure.set(e);
                collector.set_enabled(false);
            }
            settled.notify_one();
        };
        DebouncedTriggerCollector::new(driver.timers(), delay, on_batch)
    };

    collector.set_enabled(!disabled);

    info!(
        "Issuing {} trigger(s) with {:?} delay{}",
        offsets.len(),
        delay,
        if disabled { " (collector disabled)" } else { "" }
    );

    match &driver {
        Driver::Virtual(clock) => {
            let mut now_ms = 0;
            for (index, &offset_ms) in offsets.iter().enumerate() {
                clock.advance_ms(offset_ms - now_ms);
                now_ms = offset_ms;
                if failure.is_set() {
                    break;
                }
                collector.trigger(TriggerCall { index, offset_ms });
            }
            clock.advance(delay);
        }
        Driver::Tokio(platform) => {
            platform
                .run_until(async {
                    let start = Instant::now();
                    for (index, &offset_ms) in offsets.iter().enumerate() {
                        sleep_until(start + Duration::from_millis(offset_ms)).await;
                        if failure.is_set() {
                            break;
                        }
                        collector.trigger(TriggerCall { index, offset_ms });
                    }
                    // A permit left by an earlier batch only costs one extra check
                    while collector.state().is_armed() {
                        settled.notified().await;
                    }
                })
                .await;
        }
    }

    info!("{} batch(es) delivered", deliveries.get());
    failure.into_result()
}
