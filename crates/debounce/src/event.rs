//! Debounced batching of events from a named-event source
//!
//! A `DebouncedEventCollector` subscribes once to one event name on one
//! source. Every event is appended to a buffer and pushes the delivery
//! point out to `delay` after it. When the source has been quiet for `delay`,
//! the buffered events are handed to the callback as a single batch.

use crate::source::{EventSource, Subscription};
use crate::state::CollectorState;
use lull_core::{RepeatingTimer, TimerPlatform};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Batch callback: the collector, its source, and the events in arrival order
pub type EventCallback<S, E> = Rc<dyn Fn(&DebouncedEventCollector<S, E>, &S, Vec<E>)>;

/// Trailing-edge debounce over a named event
///
/// The subscription is held for the collector's whole life and is never
/// removed by the collector, not even on drop. Call
/// `source().unsubscribe(collector.subscription())` to detach it.
pub struct DebouncedEventCollector<S: ?Sized, E> {
    inner: Rc<EventInner<S, E>>,
}

struct EventInner<S: ?Sized, E> {
    source: Rc<S>,
    event: String,
    subscription: Subscription,
    /// Events since the last delivery or cancel
    pending: RefCell<Vec<E>>,
    /// Trailing timer, restarted on every event
    timer: RepeatingTimer,
    callback: RefCell<Option<EventCallback<S, E>>>,
}

impl<S, E> DebouncedEventCollector<S, E>
where
    S: EventSource<E> + ?Sized + 'static,
    E: 'static,
{
    /// Subscribe to `event` on `source` and batch with the given quiet period
    pub fn new<F>(
        platform: Rc<dyn TimerPlatform>,
        source: Rc<S>,
        event: &str,
        delay: Duration,
        callback: F,
    ) -> Self
    where
        F: Fn(&Self, &S, Vec<E>) + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<EventInner<S, E>>| {
            let listener = weak.clone();
            let subscription = source.subscribe(
                event,
                Box::new(move |evt| {
                    if let Some(inner) = listener.upgrade() {
                        Self { inner }.push(evt);
                    }
                }),
            );

            let owner = weak.clone();
            let timer = RepeatingTimer::new(platform, delay).with_tick(move |_| {
                if let Some(inner) = owner.upgrade() {
                    Self { inner }.deliver();
                }
            });

            let callback: EventCallback<S, E> = Rc::new(callback);
            EventInner {
                source,
                event: event.to_string(),
                subscription,
                pending: RefCell::new(Vec::new()),
                timer,
                callback: RefCell::new(Some(callback)),
            }
        });

        debug!(
            "Debouncing '{}' events with {:?} delay",
            inner.event,
            inner.timer.period()
        );
        Self { inner }
    }

    /// Drop buffered events and disarm the timer without delivering
    ///
    /// The subscription stays active; the next event starts a new burst.
    pub fn cancel(&self) {
        self.inner.timer.stop();
        let dropped = {
            let mut pending = self.inner.pending.borrow_mut();
            let len = pending.len();
            pending.clear();
            len
        };
        if dropped > 0 {
            debug!("Cancelled {} pending '{}' event(s)", dropped, self.inner.event);
        }
    }

    /// Number of events waiting for delivery
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    pub fn state(&self) -> CollectorState {
        CollectorState::from_armed(self.inner.timer.is_enabled())
    }

    /// Quiet period before delivery
    pub fn delay(&self) -> Duration {
        self.inner.timer.period()
    }

    /// Change the quiet period; an armed collector restarts its full delay
    pub fn set_delay(&self, delay: Duration) {
        self.inner.timer.set_interval(delay);
    }

    pub fn event_name(&self) -> &str {
        &self.inner.event
    }

    pub fn source(&self) -> &Rc<S> {
        &self.inner.source
    }

    /// Registration held on the source
    pub fn subscription(&self) -> Subscription {
        self.inner.subscription
    }

    /// Replace the batch callback
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&Self, &S, Vec<E>) + 'static,
    {
        let callback: EventCallback<S, E> = Rc::new(callback);
        *self.inner.callback.borrow_mut() = Some(callback);
    }

    /// Remove the batch callback; batches are still collected and discarded
    pub fn clear_callback(&self) {
        *self.inner.callback.borrow_mut() = None;
    }

    fn push(&self, evt: E) {
        let pending = {
            let mut buffer = self.inner.pending.borrow_mut();
            buffer.push(evt);
            buffer.len()
        };
        self.inner.timer.start();
        trace!("Buffered '{}' event ({} pending)", self.inner.event, pending);
    }

    fn deliver(&self) {
        self.inner.timer.stop();

        // Taken before the callback runs: events it causes start a new burst
        let batch = std::mem::take(&mut *self.inner.pending.borrow_mut());
        if batch.is_empty() {
            return;
        }

        debug!("Delivering {} '{}' event(s)", batch.len(), self.inner.event);
        let callback = self.inner.callback.borrow().clone();
        if let Some(callback) = callback {
            callback(self, &self.inner.source, batch);
        }
    }
}

impl<S: ?Sized, E> Clone for DebouncedEventCollector<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: ?Sized, E> fmt::Debug for DebouncedEventCollector<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedEventCollector")
            .field("event", &self.inner.event)
            .field("subscription", &self.inner.subscription)
            .field("pending", &self.inner.pending.borrow().len())
            .field("timer", &self.inner.timer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EventEmitter;
    use lull_core::ManualClock;

    type Emitter = EventEmitter<u32>;
    type Batches = Rc<RefCell<Vec<(u64, Vec<u32>)>>>;

    struct Fixture {
        clock: Rc<ManualClock>,
        source: Rc<Emitter>,
        collector: DebouncedEventCollector<Emitter, u32>,
        batches: Batches,
    }

    fn fixture(delay_ms: u64) -> Fixture {
        let clock = Rc::new(ManualClock::new());
        let source = Rc::new(Emitter::new());
        let batches: Batches = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&batches);
        let now = Rc::clone(&clock);
        let collector = DebouncedEventCollector::new(
            clock.clone(),
            Rc::clone(&source),
            "input",
            Duration::from_millis(delay_ms),
            move |_, _, events| {
                sink.borrow_mut()
                    .push((now.elapsed().as_millis() as u64, events));
            },
        );

        Fixture {
            clock,
            source,
            collector,
            batches,
        }
    }

    #[test]
    fn test_single_burst_single_delivery() {
        let f = fixture(50);

        for value in 0..5 {
            f.source.emit("input", value);
            f.clock.advance_ms(1);
        }
        // Last event at t=4, delivery due at t=54
        f.clock.advance_ms(48);
        assert!(f.batches.borrow().is_empty());
        assert_eq!(f.collector.state(), CollectorState::Armed);

        f.clock.advance_ms(1);
        assert_eq!(*f.batches.borrow(), vec![(54, vec![0, 1, 2, 3, 4])]);
        assert_eq!(f.collector.state(), CollectorState::Idle);
        assert_eq!(f.collector.pending_len(), 0);
    }

    #[test]
    fn test_quiet_gap_splits_bursts() {
        let f = fixture(20);

        f.source.emit("input", 1);
        f.clock.advance_ms(5);
        f.source.emit("input", 2);
        f.clock.advance_ms(20);
        f.source.emit("input", 3);
        f.clock.advance_ms(100);

        assert_eq!(
            *f.batches.borrow(),
            vec![(25, vec![1, 2]), (45, vec![3])]
        );
    }

    #[test]
    fn test_other_event_names_ignored() {
        let f = fixture(10);

        f.source.emit("other", 7);
        f.clock.advance_ms(50);

        assert!(f.batches.borrow().is_empty());
        assert_eq!(f.collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_cancel_suppresses_delivery() {
        let f = fixture(30);

        f.source.emit("input", 1);
        f.source.emit("input", 2);
        f.clock.advance_ms(10);
        f.collector.cancel();
        assert_eq!(f.collector.pending_len(), 0);
        assert_eq!(f.collector.state(), CollectorState::Idle);

        f.clock.advance_ms(100);
        assert!(f.batches.borrow().is_empty());

        // Still subscribed after cancel
        f.source.emit("input", 3);
        f.clock.advance_ms(30);
        assert_eq!(*f.batches.borrow(), vec![(140, vec![3])]);
    }

    #[test]
    fn test_callback_receives_source() {
        let clock = Rc::new(ManualClock::new());
        let source = Rc::new(Emitter::new());
        let hits = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&hits);
        let expected = Rc::clone(&source);
        let _collector: DebouncedEventCollector<Emitter, u32> = DebouncedEventCollector::new(
            clock.clone(),
            Rc::clone(&source),
            "input",
            Duration::from_millis(10),
            move |collector, src, events| {
                assert!(std::ptr::eq(src, &*expected));
                assert_eq!(collector.event_name(), "input");
                sink.borrow_mut().extend(events);
            },
        );

        source.emit("input", 11);
        clock.advance_ms(10);
        assert_eq!(*hits.borrow(), vec![11]);
    }

    #[test]
    fn test_events_during_callback_start_new_burst() {
        let clock = Rc::new(ManualClock::new());
        let source = Rc::new(Emitter::new());
        let batches: Batches = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&batches);
        let now = Rc::clone(&clock);
        let _collector: DebouncedEventCollector<Emitter, u32> = DebouncedEventCollector::new(
            clock.clone(),
            Rc::clone(&source),
            "input",
            Duration::from_millis(10),
            move |_, src: &Emitter, events| {
                if events == vec![1] {
                    src.emit("input", 2);
                }
                sink.borrow_mut()
                    .push((now.elapsed().as_millis() as u64, events));
            },
        );

        source.emit("input", 1);
        clock.advance_ms(30);
        assert_eq!(*batches.borrow(), vec![(10, vec![1]), (20, vec![2])]);
    }

    #[test]
    fn test_set_delay_while_armed_restarts() {
        let f = fixture(50);

        f.source.emit("input", 1);
        f.clock.advance_ms(40);
        f.collector.set_delay(Duration::from_millis(30));
        f.clock.advance_ms(29);
        assert!(f.batches.borrow().is_empty());
        f.clock.advance_ms(1);
        assert_eq!(*f.batches.borrow(), vec![(70, vec![1])]);
    }

    #[test]
    fn test_cleared_callback_discards_batches() {
        let f = fixture(10);
        f.collector.clear_callback();

        f.source.emit("input", 1);
        f.clock.advance_ms(10);
        assert!(f.batches.borrow().is_empty());
        assert_eq!(f.collector.pending_len(), 0);
        assert_eq!(f.collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_subscription_left_to_owner() {
        let f = fixture(10);
        assert_eq!(f.source.listener_count("input"), 1);

        assert!(f.source.unsubscribe(f.collector.subscription()));
        f.source.emit("input", 5);
        f.clock.advance_ms(20);
        assert!(f.batches.borrow().is_empty());
    }

    #[test]
    fn test_drop_releases_timer() {
        let f = fixture(10);
        f.source.emit("input", 5);
        assert_eq!(f.clock.active_timers(), 1);

        drop(f.collector);
        assert_eq!(f.clock.active_timers(), 0);

        // The stale listener is inert
        f.source.emit("input", 6);
        f.clock.advance_ms(20);
        assert!(f.batches.borrow().is_empty());
    }
}
