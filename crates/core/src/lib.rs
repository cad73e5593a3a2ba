//! Timer primitives for Lull
//!
//! This crate provides:
//! - Platform capabilities (`TimerPlatform`, `Clock`) injected into every timer
//! - A virtual-time platform (`ManualClock`) for custom loops and tests
//! - A tokio-backed platform (`TokioPlatform`) running on a `LocalSet`
//! - `RepeatingTimer`, a restartable periodic timer
//! - `Stopwatch`
//! - TOML configuration and the library error type
//!
//! Everything here is single-threaded: handles are `Rc`-based and `!Send`.

pub mod clock;
pub mod config;
pub mod error;
pub mod platform;
pub mod runtime;
pub mod stopwatch;
pub mod timer;

// Re-exports
pub use clock::ManualClock;
pub use config::{DebounceConfig, LoggingConfig, LullConfig, TimerConfig};
pub use error::Error;
pub use platform::{Clock, SystemClock, TimerHandle, TimerPlatform};
pub use runtime::TokioPlatform;
pub use stopwatch::Stopwatch;
pub use timer::{RepeatingTimer, TickFn};

/// Result type for lull operations
pub type Result<T> = std::result::Result<T, Error>;
