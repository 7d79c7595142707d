//! Bar-by-bar replay.
//!
//! [`ReplayController`] owns the cursor into a bar sequence and reveals one
//! bar per timer tick while playing. Time comes from an injected [`Clock`],
//! and the recurring tick is a [`TickScheduler`] with exactly one armed timer
//! at a time.

pub mod clock;
pub mod controller;
pub mod scheduler;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{ReplayController, ReplayState, ReplayStatus, DEFAULT_SPEED_MS};
pub use scheduler::{TickScheduler, TimerToken};
