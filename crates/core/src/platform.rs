//! Platform capabilities injected into timers
//!
//! Timers never reach for an ambient event loop. They are handed a
//! `TimerPlatform` that can schedule and cancel periodic callbacks, and
//! optionally a `Clock` for reading the current time.

use std::time::{Duration, Instant};

/// Smallest period a platform will schedule
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Opaque handle to a scheduled periodic callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a platform-specific id
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Platform-specific id
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Periodic timer primitive
///
/// `schedule` fires `tick` every `period` (first fire one period after the
/// call) until the returned handle is cancelled. Callbacks run on the same
/// thread as the caller, one at a time. Implementations must not hold
/// internal borrows while a tick runs, so a tick may schedule or cancel
/// timers, including its own.
pub trait TimerPlatform {
    /// Schedule a periodic callback
    fn schedule(&self, period: Duration, tick: Box<dyn FnMut()>) -> TimerHandle;

    /// Cancel a scheduled callback; unknown handles are ignored
    fn cancel(&self, handle: TimerHandle);
}

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clamp a period to what platforms accept
pub(crate) fn clamp_period(period: Duration) -> Duration {
    period.max(MIN_PERIOD)
}
