//! Simple stopwatch over an injected clock

use crate::platform::Clock;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Measures elapsed time between `start` and `stop`
pub struct Stopwatch {
    clock: Rc<dyn Clock>,
    started: Option<Instant>,
    stopped: Option<Instant>,
}

impl Stopwatch {
    /// Create a stopwatch, optionally already running
    pub fn new(clock: Rc<dyn Clock>, immediate_start: bool) -> Self {
        let started = immediate_start.then(|| clock.now());
        Self {
            clock,
            started,
            stopped: None,
        }
    }

    /// (Re)start measuring from now
    pub fn start(&mut self) {
        self.started = Some(self.clock.now());
        self.stopped = None;
    }

    /// Stop and return the measured time, `None` if never started
    pub fn stop(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        self.stopped = Some(now);
        self.started.map(|started| now.saturating_duration_since(started))
    }

    /// Time measured so far; keeps counting until `stop`
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started?;
        let end = self.stopped.unwrap_or_else(|| self.clock.now());
        Some(end.saturating_duration_since(started))
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some() && self.stopped.is_none()
    }
}
