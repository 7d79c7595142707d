//! barplay core: indicator math and bar-by-bar replay for OHLCV charts.
//!
//! This crate contains everything a chart front-end needs that is not pixels:
//! - Domain types (bars, bar sequences, timeframes)
//! - Indicator calculator (moving average, RSI-style oscillator), batch and streaming
//! - Data source adapter (seeded synthetic generator, delimited-file import)
//! - Replay controller: play/pause/step/seek state machine on a cancellable tick timer
//! - Session settings with a write-through settings store
//! - Render adapter contract consumed by front-ends
//! - Session wiring that ties the above together

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod render;
pub mod replay;
pub mod rng;
pub mod session;
pub mod settings;

pub use config::{ChartConfig, ConfigError};
pub use data::{DataError, DataOrigin, ImportReport};
pub use domain::{Bar, BarError, BarSequence, Timeframe};
pub use indicators::{IndicatorError, IndicatorKind, IndicatorPoint, IndicatorSeries};
pub use render::{Candle, RenderSink, VolumeBar};
pub use replay::{ManualClock, MonotonicClock, ReplayController, ReplayState, ReplayStatus};
pub use session::{ChartSession, ImportOutcome, ViewMode};
pub use settings::{
    JsonFileStore, MemoryStore, SessionSettings, SettingsError, SettingsHandle, SettingsStore, Theme,
};
