//! Named-event sources
//!
//! Collectors subscribe through the `EventSource` capability. Unsubscribing
//! is the owner's business: a collector keeps its subscription for life and
//! only exposes the handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Handle identifying one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Capability to listen for named events carrying values of type `E`
pub trait EventSource<E> {
    /// Register `listener` for every event named `event`
    fn subscribe(&self, event: &str, listener: Box<dyn Fn(E)>) -> Subscription;

    /// Remove a registration; returns false if it was not registered
    fn unsubscribe(&self, subscription: Subscription) -> bool;
}

type Listener<E> = Rc<dyn Fn(E)>;

/// In-process named-event dispatcher
///
/// Listeners run synchronously inside `emit`, in registration order. A
/// listener may emit, subscribe or unsubscribe; changes apply to the next
/// `emit`.
pub struct EventEmitter<E> {
    listeners: RefCell<Vec<(Subscription, String, Listener<E>)>>,
    next_id: Cell<u64>,
}

impl<E: Clone> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Deliver `payload` to every listener of `event`, returns how many ran
    pub fn emit(&self, event: &str, payload: E) -> usize {
        let targets: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();

        trace!("Emitting '{}' to {} listener(s)", event, targets.len());
        for listener in &targets {
            listener(payload.clone());
        }
        targets.len()
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .count()
    }
}

impl<E: Clone> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventSource<E> for EventEmitter<E> {
    fn subscribe(&self, event: &str, listener: Box<dyn Fn(E)>) -> Subscription {
        let subscription = Subscription(self.next_id.get());
        self.next_id.set(subscription.0 + 1);
        self.listeners
            .borrow_mut()
            .push((subscription, event.to_string(), Rc::from(listener)));
        subscription
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(sub, _, _)| *sub == subscription)
                .map(|index| listeners.remove(index))
        };
        removed.is_some()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
