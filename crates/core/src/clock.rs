//! Virtual-time timer platform
//!
//! `ManualClock` keeps its own notion of "now" and only moves it forward when
//! told to. Embedders with their own frame or event loop call `advance` once
//! per iteration; tests use it to step through exact schedules.

use crate::platform::{clamp_period, Clock, TimerHandle, TimerPlatform};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

type SharedTick = Rc<RefCell<Box<dyn FnMut()>>>;

/// Deadline key: (offset from origin, registration sequence)
type DueKey = (Duration, u64);

/// Timer platform driven by explicit `advance` calls
///
/// Due timers fire in deadline order; timers sharing a deadline fire in the
/// order they were (re)armed. A periodic timer is re-armed before its tick
/// runs, so a tick that cancels itself leaves nothing behind.
pub struct ManualClock {
    /// Instant corresponding to virtual offset zero
    origin: Instant,

    /// Schedule state, never borrowed while a tick runs
    state: RefCell<Schedule>,
}

#[derive(Default)]
struct Schedule {
    /// Virtual time elapsed since `origin`
    elapsed: Duration,
    next_id: u64,
    next_seq: u64,
    timers: HashMap<TimerHandle, Entry>,
    queue: BTreeMap<DueKey, TimerHandle>,
}

struct Entry {
    period: Duration,
    due: DueKey,
    tick: SharedTick,
}

impl Schedule {
    fn arm(&mut self, handle: TimerHandle, due: Duration) -> DueKey {
        let key = (due, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(key, handle);
        key
    }

    /// Pop the next timer due at or before `target`, re-arming it
    fn pop_due(&mut self, target: Duration) -> Option<SharedTick> {
        let (&key, &handle) = self.queue.iter().next()?;
        if key.0 > target {
            return None;
        }
        self.queue.remove(&key);
        self.elapsed = key.0;

        let period = self.timers.get(&handle)?.period;
        let next = self.arm(handle, key.0 + period);
        let entry = self.timers.get_mut(&handle)?;
        entry.due = next;
        Some(Rc::clone(&entry.tick))
    }
}

impl ManualClock {
    /// Create a clock at virtual time zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: RefCell::new(Schedule::default()),
        }
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.state.borrow().elapsed
    }

    /// Number of scheduled timers
    pub fn active_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Time until the next timer is due, if any
    pub fn next_due(&self) -> Option<Duration> {
        let state = self.state.borrow();
        state
            .queue
            .keys()
            .next()
            .map(|(due, _)| due.saturating_sub(state.elapsed))
    }

    /// Move virtual time forward, firing every tick that falls due
    ///
    /// Must not be called from inside a tick.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().elapsed + by;

        loop {
            let tick = self.state.borrow_mut().pop_due(target);
            let Some(tick) = tick else { break };
            let mut tick = tick.borrow_mut();
            (*tick)();
        }

        self.state.borrow_mut().elapsed = target;
    }

    /// Advance in millisecond steps, convenient for scripted scenarios
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerPlatform for ManualClock {
    fn schedule(&self, period: Duration, tick: Box<dyn FnMut()>) -> TimerHandle {
        let period = clamp_period(period);
        let mut state = self.state.borrow_mut();

        let handle = TimerHandle::from_raw(state.next_id);
        state.next_id += 1;

        let due = state.elapsed + period;
        let key = state.arm(handle, due);
        state.timers.insert(
            handle,
            Entry {
                period,
                due: key,
                tick: Rc::new(RefCell::new(tick)),
            },
        );
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let entry = state.timers.remove(&handle);
            if let Some(entry) = &entry {
                state.queue.remove(&entry.due);
            }
            entry
        };
        // Dropping a tick may drop timer state that cancels other handles
        drop(removed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<(u64, &'static str)>>>;

    fn recorder(clock: &Rc<ManualClock>, log: &Log, name: &'static str) -> Box<dyn FnMut()> {
        let clock = Rc::clone(clock);
        let log = Rc::clone(log);
        Box::new(move || {
            log.borrow_mut()
                .push((clock.elapsed().as_millis() as u64, name));
        })
    }

    #[test]
    fn test_periodic_ticks() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        clock.schedule(Duration::from_millis(30), recorder(&clock, &log, "a"));

        clock.advance_ms(29);
        assert!(log.borrow().is_empty());

        clock.advance_ms(71);
        assert_eq!(*log.borrow(), vec![(30, "a"), (60, "a"), (90, "a")]);
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
        assert_eq!(clock.next_due(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_deadline_then_registration_order() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        clock.schedule(Duration::from_millis(20), recorder(&clock, &log, "slow"));
        clock.schedule(Duration::from_millis(10), recorder(&clock, &log, "fast"));

        clock.advance_ms(20);
        assert_eq!(
            *log.borrow(),
            vec![(10, "fast"), (20, "slow"), (20, "fast")]
        );
    }

    #[test]
    fn test_cancel() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = clock.schedule(Duration::from_millis(10), recorder(&clock, &log, "a"));

        clock.advance_ms(10);
        clock.cancel(handle);
        clock.advance_ms(100);

        assert_eq!(*log.borrow(), vec![(10, "a")]);
        assert_eq!(clock.active_timers(), 0);
        assert_eq!(clock.next_due(), None);

        // Cancelling twice is harmless
        clock.cancel(handle);
    }

    #[test]
    fn test_tick_cancels_itself() {
        let clock = Rc::new(ManualClock::new());
        let fired = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));

        let handle = {
            let clock2 = Rc::clone(&clock);
            let fired = Rc::clone(&fired);
            let slot = Rc::clone(&slot);
            clock.schedule(
                Duration::from_millis(5),
                Box::new(move || {
                    fired.set(fired.get() + 1);
                    if let Some(handle) = slot.get() {
                        clock2.cancel(handle);
                    }
                }),
            )
        };
        slot.set(Some(handle));

        clock.advance_ms(50);
        assert_eq!(fired.get(), 1);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn test_tick_schedules_from_current_time() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let clock2 = Rc::clone(&clock);
        let log2 = Rc::clone(&log);
        let armed = Rc::new(Cell::new(false));
        clock.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                if !armed.replace(true) {
                    let tick = recorder(&clock2, &log2, "nested");
                    clock2.schedule(Duration::from_millis(15), tick);
                }
            }),
        );

        clock.advance_ms(40);
        assert_eq!(*log.borrow(), vec![(25, "nested"), (40, "nested")]);
    }

    #[test]
    fn test_zero_period_clamped() {
        let clock = Rc::new(ManualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        clock.schedule(Duration::ZERO, recorder(&clock, &log, "z"));

        clock.advance_ms(3);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_now_tracks_virtual_time() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance_ms(250);
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }
}
