//! Collector state

/// Observable state shared by both collectors
///
/// `Idle` → `Armed` on the first buffered input, `Armed` → `Armed` on each
/// further input (timer restarted), `Armed` → `Idle` on delivery or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Nothing buffered, timer disarmed
    Idle,
    /// Inputs buffered, trailing timer running
    Armed,
}

impl CollectorState {
    pub(crate) fn from_armed(armed: bool) -> Self {
        if armed {
            Self::Armed
        } else {
            Self::Idle
        }
    }

    pub fn is_armed(self) -> bool {
        self == Self::Armed
    }
}
