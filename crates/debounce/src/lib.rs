//! Trailing-edge debounce collectors
//!
//! This crate provides:
//! - `EventSource`, the capability to subscribe to named events
//! - `EventEmitter`, an in-process named-event dispatcher
//! - `DebouncedEventCollector`, batching events from a source
//! - `DebouncedTriggerCollector`, batching direct `trigger` calls
//!
//! Both collectors buffer inputs in arrival order and restart their trailing
//! timer on every input. Once the input stream has been quiet for the
//! configured delay, the whole buffer is delivered in one callback.

pub mod event;
pub mod source;
pub mod state;
pub mod trigger;

// Re-exports
pub use event::{DebouncedEventCollector, EventCallback};
pub use source::{EventEmitter, EventSource, Subscription};
pub use state::CollectorState;
pub use trigger::{DebouncedTriggerCollector, TriggerCallback};
