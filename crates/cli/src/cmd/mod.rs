//! Command implementations

pub mod config;
pub mod stdin;
pub mod tick;
pub mod trigger;

use anyhow::{Context, Result};
use lull_core::{Clock, ManualClock, TimerPlatform, TokioPlatform};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

/// Where timers run: virtual time stepped by the command, or the tokio clock
pub enum Driver {
    Virtual(Rc<ManualClock>),
    Tokio(Rc<TokioPlatform>),
}

impl Driver {
    pub fn new(virtual_time: bool) -> Self {
        if virtual_time {
            Self::Virtual(Rc::new(ManualClock::new()))
        } else {
            Self::Tokio(Rc::new(TokioPlatform::new()))
        }
    }

    pub fn timers(&self) -> Rc<dyn TimerPlatform> {
        match self {
            Self::Virtual(clock) => clock.clone(),
            Self::Tokio(platform) => platform.clone(),
        }
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        match self {
            Self::Virtual(clock) => clock.clone(),
            Self::Tokio(platform) => platform.clone(),
        }
    }
}

/// One timer tick
#[derive(Debug, Serialize)]
pub struct TickRecord {
    pub tick: u32,
    pub at_ms: u64,
}

/// One debounced delivery
#[derive(Debug, Serialize)]
pub struct BatchRecord<T: Serialize> {
    pub at_ms: u64,
    pub batch: Vec<T>,
}

/// Write a record as one JSON line on stdout
///
/// Fails instead of panicking when stdout is gone (closed pipe).
pub fn print_json<T: Serialize>(record: &T) -> Result<()> {
    let line = serde_json::to_string(record).context("Failed to serialize output record")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// First error raised inside a timer callback
///
/// Callbacks can't return errors to the command, so they park the error
/// here and the command returns it once the timers are stopped.
#[derive(Clone, Default)]
pub struct CallbackFailure(Rc<RefCell<Option<anyhow::Error>>>);

impl CallbackFailure {
    /// Record `error` unless an earlier one is already held
    pub fn set(&self, error: anyhow::Error) {
        let mut slot = self.0.borrow_mut();
        match slot.as_ref() {
            Some(_) => warn!("Dropping follow-up callback error: {:#}", error),
            None => *slot = Some(error),
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Return the held error, if any
    pub fn into_result(self) -> Result<()> {
        match self.0.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub fn as_millis(elapsed: Option<Duration>) -> u64 {
    elapsed.map(|d| d.as_millis() as u64).unwrap_or(0)
}
