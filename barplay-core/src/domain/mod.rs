//! Domain types for barplay

pub mod bar;
pub mod timeframe;

pub use bar::{Bar, BarError, BarSequence};
pub use timeframe::{ParseTimeframeError, Timeframe};
