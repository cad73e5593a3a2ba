//! Debounce stdin lines
//!
//! Each line is emitted as an event on an in-process emitter that a
//! `DebouncedEventCollector` listens to. Batches are printed as JSON lines.
//! At EOF the pending burst is allowed to settle before exiting.

use super::{as_millis, print_json, BatchRecord, CallbackFailure};
use anyhow::{Context, Result};
use lull_core::{LullConfig, Stopwatch, TokioPlatform};
use lull_debounce::{DebouncedEventCollector, EventEmitter};
use std::rc::Rc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{debug, info};

pub async fn run(config: &LullConfig, delay_ms: Option<u64>, event: &str) -> Result<()> {
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.debounce.delay_ms));
    if delay.is_zero() {
        anyhow::bail!("--delay-ms must be greater than zero");
    }

    let platform = Rc::new(TokioPlatform::new());
    let source = Rc::new(EventEmitter::<String>::new());
    let stopwatch = Stopwatch::new(platform.clone(), true);
    let settled = Rc::new(Notify::new());
    let failure = CallbackFailure::default();

    let collector = {
        let settled = Rc::clone(&settled);
        let failure = failure.clone();
        DebouncedEventCollector::new(
            platform.clone(),
            Rc::clone(&source),
            event,
            delay,
            move |collector, _, lines: Vec<String>| {
                let record = BatchRecord {
                    at_ms: as_millis(stopwatch.elapsed()),
                    batch: lines,
                };
                if let Err(e) = print_json(&record) {
                    failure.set(e);
                    collector.cancel();
                }
                settled.notify_one();
            },
        )
    };

    info!("Debouncing stdin lines as '{}' events ({:?} delay)", event, delay);

    let read = platform
        .run_until(async {
            let read = forward_lines(&source, event, &failure).await;

            // Lines already buffered are delivered even when reading failed
            while collector.state().is_armed() {
                settled.notified().await;
            }
            read
        })
        .await;

    failure.into_result()?;
    let count = read?;
    debug!("Stdin closed after {} line(s)", count);
    Ok(())
}

/// Emit every stdin line until EOF, a read error, or a failed delivery
///
/// Invalid UTF-8 is replaced rather than treated as an error.
async fn forward_lines(
    source: &EventEmitter<String>,
    event: &str,
    failure: &CallbackFailure,
) -> Result<usize> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    let mut count = 0usize;

    while !failure.is_set() {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }
        count += 1;
        source.emit(event, decode_line(&buf));
    }
    Ok(count)
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
