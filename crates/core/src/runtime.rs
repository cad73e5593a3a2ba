//! Tokio-backed timer platform
//!
//! Each scheduled timer is a task on a `LocalSet` owned by the platform, so
//! ticks run on the thread that drives the set and may touch `Rc` state.
//! Drive the platform with `run_until` from inside a tokio runtime.

use crate::platform::{clamp_period, Clock, TimerHandle, TimerPlatform};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, LocalSet};
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Timer platform running ticks as local tokio tasks
pub struct TokioPlatform {
    local: LocalSet,
    tasks: RefCell<HashMap<TimerHandle, JoinHandle<()>>>,
    next_id: Cell<u64>,
}

impl TokioPlatform {
    pub fn new() -> Self {
        Self {
            local: LocalSet::new(),
            tasks: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Drive scheduled timers until `future` completes
    ///
    /// Timers only make progress while this is being awaited.
    pub async fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.local.run_until(future).await
    }

    /// Number of timers currently scheduled
    pub fn active_timers(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Default for TokioPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerPlatform for TokioPlatform {
    fn schedule(&self, period: Duration, mut tick: Box<dyn FnMut()>) -> TimerHandle {
        let period = clamp_period(period);
        let handle = TimerHandle::from_raw(self.next_id.get());
        self.next_id.set(handle.raw() + 1);

        // interval() fires immediately; the first tick belongs one period out
        let start = tokio::time::Instant::now() + period;
        let task = self.local.spawn_local(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });

        trace!("Scheduled timer {:?} every {:?}", handle, period);
        self.tasks.borrow_mut().insert(handle, task);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let task = self.tasks.borrow_mut().remove(&handle);
        if let Some(task) = task {
            // A task aborting itself stops at its next await point
            task.abort();
            trace!("Cancelled timer {:?}", handle);
        }
    }
}

impl Clock for TokioPlatform {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
