//! Debounced batching of direct calls
//!
//! `DebouncedTriggerCollector` batches values passed to `trigger` the same
//! way `DebouncedEventCollector` batches events, without an event source.
//! It can be disabled: a disabled collector ignores triggers and throws
//! away whatever was still buffered when its timer fires.

use crate::state::CollectorState;
use lull_core::{DebounceConfig, RepeatingTimer, TimerPlatform};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Batch callback: the collector and the trigger arguments in call order
pub type TriggerCallback<A> = Rc<dyn Fn(&DebouncedTriggerCollector<A>, Vec<A>)>;

/// Trailing-edge debounce over `trigger` calls
pub struct DebouncedTriggerCollector<A> {
    inner: Rc<TriggerInner<A>>,
}

struct TriggerInner<A> {
    /// Arguments since the last delivery or cancel, stored verbatim
    pending: RefCell<Vec<A>>,
    timer: RepeatingTimer,
    enabled: Cell<bool>,
    callback: RefCell<Option<TriggerCallback<A>>>,
}

impl<A: 'static> DebouncedTriggerCollector<A> {
    /// Create an enabled collector with the given quiet period
    pub fn new<F>(platform: Rc<dyn TimerPlatform>, delay: Duration, callback: F) -> Self
    where
        F: Fn(&Self, Vec<A>) + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<TriggerInner<A>>| {
            let owner = weak.clone();
            let timer = RepeatingTimer::new(platform, delay).with_tick(move |_| {
                if let Some(inner) = owner.upgrade() {
                    Self { inner }.deliver();
                }
            });

            let callback: TriggerCallback<A> = Rc::new(callback);
            TriggerInner {
                pending: RefCell::new(Vec::new()),
                timer,
                enabled: Cell::new(true),
                callback: RefCell::new(Some(callback)),
            }
        });
        Self { inner }
    }

    /// Create a collector from config, honouring `start_enabled`
    pub fn from_config<F>(
        platform: Rc<dyn TimerPlatform>,
        config: &DebounceConfig,
        callback: F,
    ) -> Self
    where
        F: Fn(&Self, Vec<A>) + 'static,
    {
        let collector = Self::new(platform, config.delay(), callback);
        collector.set_enabled(config.start_enabled);
        collector
    }

    /// Buffer `args` and restart the quiet period; ignored while disabled
    pub fn trigger(&self, args: A) {
        if !self.is_enabled() {
            trace!("Trigger ignored, collector disabled");
            return;
        }

        let pending = {
            let mut buffer = self.inner.pending.borrow_mut();
            buffer.push(args);
            buffer.len()
        };
        self.inner.timer.start();
        trace!("Trigger buffered ({} pending)", pending);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Gate new triggers and pending deliveries
    ///
    /// Disabling does not disarm the timer; when it fires while disabled,
    /// the buffer is dropped instead of delivered.
    pub fn set_enabled(&self, enabled: bool) {
        if self.inner.enabled.replace(enabled) != enabled {
            debug!("Trigger collector {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Drop buffered triggers and disarm the timer without delivering
    pub fn cancel(&self) {
        self.inner.timer.stop();
        self.inner.pending.borrow_mut().clear();
    }

    /// Number of triggers waiting for delivery
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    pub fn state(&self) -> CollectorState {
        CollectorState::from_armed(self.inner.timer.is_enabled())
    }

    pub fn delay(&self) -> Duration {
        self.inner.timer.period()
    }

    /// Change the quiet period; an armed collector restarts its full delay
    pub fn set_delay(&self, delay: Duration) {
        self.inner.timer.set_interval(delay);
    }

    /// Replace the batch callback
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&Self, Vec<A>) + 'static,
    {
        let callback: TriggerCallback<A> = Rc::new(callback);
        *self.inner.callback.borrow_mut() = Some(callback);
    }

    /// Remove the batch callback; batches are still collected and discarded
    pub fn clear_callback(&self) {
        *self.inner.callback.borrow_mut() = None;
    }

    fn deliver(&self) {
        self.inner.timer.stop();
        let batch = std::mem::take(&mut *self.inner.pending.borrow_mut());

        if !self.is_enabled() {
            if !batch.is_empty() {
                debug!("Discarded {} trigger(s) while disabled", batch.len());
            }
            return;
        }
        if batch.is_empty() {
            return;
        }

        debug!("Delivering {} trigger(s)", batch.len());
        let callback = self.inner.callback.borrow().clone();
        if let Some(callback) = callback {
            callback(self, batch);
        }
    }
}

impl<A> Clone for DebouncedTriggerCollector<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for DebouncedTriggerCollector<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedTriggerCollector")
            .field("enabled", &self.inner.enabled.get())
            .field("pending", &self.inner.pending.borrow().len())
            .field("timer", &self.inner.timer)
            .finish()
    }
}
