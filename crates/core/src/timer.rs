//! Restartable periodic timer
//!
//! `RepeatingTimer` wraps a `TimerPlatform` handle with start/stop/reconfigure
//! semantics:
//! - `start` on a running timer restarts it (never registers twice)
//! - `set_interval` on a running timer restarts it, discarding the time
//!   already elapsed in the current period
//! - clearing the repeat flag makes the next tick the last one

use crate::config::TimerConfig;
use crate::platform::{clamp_period, TimerHandle, TimerPlatform};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Period used when a timer is created with a zero period
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Tick callback, receives the timer that fired
pub type TickFn = Rc<dyn Fn(&RepeatingTimer)>;

/// Periodic timer over an injected platform
///
/// Cloning yields another handle to the same timer. The platform timer is
/// cancelled when the last handle is dropped.
#[derive(Clone)]
pub struct RepeatingTimer {
    inner: Rc<TimerInner>,
}

struct TimerInner {
    platform: Rc<dyn TimerPlatform>,
    state: RefCell<TimerState>,
}

struct TimerState {
    period: Duration,
    repeat: bool,
    /// Present iff the timer is running
    handle: Option<TimerHandle>,
    tick: Option<TickFn>,
}

impl RepeatingTimer {
    /// Create a stopped timer without a tick callback
    pub fn new(platform: Rc<dyn TimerPlatform>, period: Duration) -> Self {
        let period = if period.is_zero() { DEFAULT_PERIOD } else { period };
        Self {
            inner: Rc::new(TimerInner {
                platform,
                state: RefCell::new(TimerState {
                    period,
                    repeat: true,
                    handle: None,
                    tick: None,
                }),
            }),
        }
    }

    /// Create a timer from config, started if `start_enabled` is set
    pub fn from_config<F>(platform: Rc<dyn TimerPlatform>, config: &TimerConfig, tick: F) -> Self
    where
        F: Fn(&RepeatingTimer) + 'static,
    {
        let timer = Self::new(platform, config.period()).with_tick(tick);
        if config.start_enabled {
            timer.start();
        }
        timer
    }

    /// Set the tick callback, builder style
    pub fn with_tick<F>(self, tick: F) -> Self
    where
        F: Fn(&RepeatingTimer) + 'static,
    {
        self.set_tick(tick);
        self
    }

    /// Replace the tick callback
    pub fn set_tick<F>(&self, tick: F)
    where
        F: Fn(&RepeatingTimer) + 'static,
    {
        self.inner.state.borrow_mut().tick = Some(Rc::new(tick));
    }

    /// Remove the tick callback; ticks keep happening but call nothing
    pub fn clear_tick(&self) {
        self.inner.state.borrow_mut().tick = None;
    }

    /// Start firing every period, restarting if already running
    pub fn start(&self) {
        if self.is_enabled() {
            self.stop();
        }

        let period = self.period();
        let weak: Weak<TimerInner> = Rc::downgrade(&self.inner);
        let handle = self.inner.platform.schedule(
            period,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    RepeatingTimer { inner }.fire();
                }
            }),
        );

        self.inner.state.borrow_mut().handle = Some(handle);
        trace!("Timer started ({:?})", period);
    }

    /// Stop the timer; no-op when already stopped
    pub fn stop(&self) {
        let handle = self.inner.state.borrow_mut().handle.take();
        if let Some(handle) = handle {
            self.inner.platform.cancel(handle);
            trace!("Timer stopped");
        }
    }

    /// Whether the timer is currently scheduled
    pub fn is_enabled(&self) -> bool {
        self.inner.state.borrow().handle.is_some()
    }

    pub fn period(&self) -> Duration {
        self.inner.state.borrow().period
    }

    /// Change the period
    ///
    /// A running timer is restarted: the next tick comes one full new period
    /// after this call, whatever was already elapsed.
    pub fn set_interval(&self, period: Duration) {
        let period = clamp_period(period);
        self.inner.state.borrow_mut().period = period;
        if self.is_enabled() {
            debug!("Timer period changed to {:?}, restarting", period);
            self.stop();
            self.start();
        }
    }

    pub fn repeat(&self) -> bool {
        self.inner.state.borrow().repeat
    }

    /// When false, the next tick stops the timer before running the callback
    pub fn set_repeat(&self, repeat: bool) {
        self.inner.state.borrow_mut().repeat = repeat;
    }

    fn fire(&self) {
        let (repeat, tick) = {
            let state = self.inner.state.borrow();
            (state.repeat, state.tick.clone())
        };

        if !repeat {
            self.stop();
        }
        if let Some(tick) = tick {
            tick(self);
        }
    }
}

impl fmt::Debug for RepeatingTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("RepeatingTimer")
            .field("period", &state.period)
            .field("repeat", &state.repeat)
            .field("handle", &state.handle)
            .field("has_tick", &state.tick.is_some())
            .finish()
    }
}

impl Drop for TimerInner {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().handle.take() {
            self.platform.cancel(handle);
        }
    }
}
