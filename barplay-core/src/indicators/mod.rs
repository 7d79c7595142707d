//! Indicator calculator.
//!
//! Indicators are pure functions: bar history in, numeric series out. Each
//! implementation produces a series aligned to the input bars with `f64::NAN`
//! in the warmup slots; [`IndicatorSeries`] drops the warmup and keeps only
//! `(time, value)` points that can be handed to a render adapter.
//!
//! Replay uses the streaming counterparts in [`stream`], which produce the
//! same values one bar at a time.

pub mod rsi;
pub mod sma;
pub mod stream;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

pub use rsi::Rsi;
pub use sma::Sma;
pub use stream::{IndicatorStream, RsiStream, SmaStream};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("indicator period must be >= 1, got {0}")]
    InvalidPeriod(i64),
}

/// The overlays a chart can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    MovingAverage,
    Oscillator,
}

impl IndicatorKind {
    pub fn label(self) -> &'static str {
        match self {
            IndicatorKind::MovingAverage => "MA",
            IndicatorKind::Oscillator => "RSI",
        }
    }

    pub fn all() -> [IndicatorKind; 2] {
        [IndicatorKind::MovingAverage, IndicatorKind::Oscillator]
    }
}

/// Trait for batch indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on bars after t: computing over a truncated
/// prefix must reproduce the full-series values for that prefix.
pub trait Indicator: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    fn period(&self) -> usize;

    /// Number of leading bars with no value.
    fn lookback(&self) -> usize;

    /// Compute over the whole bar slice.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`; the first
    /// `lookback()` entries are `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Compute and strip the warmup into a renderable series.
    fn series(&self, bars: &[Bar]) -> IndicatorSeries {
        let values = self.compute(bars);
        IndicatorSeries::from_aligned(self.kind(), self.period(), bars, &values, self.lookback())
    }
}

/// One overlay value at a bar time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: f64,
}

/// A computed overlay: `kind`, `period` and its points in ascending time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub period: usize,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(kind: IndicatorKind, period: usize) -> Self {
        Self {
            kind,
            period,
            points: Vec::new(),
        }
    }

    /// Build from values aligned to `bars`, skipping the first `lookback`
    /// entries. Non-finite values never reach the points list.
    pub fn from_aligned(
        kind: IndicatorKind,
        period: usize,
        bars: &[Bar],
        values: &[f64],
        lookback: usize,
    ) -> Self {
        let points = bars
            .iter()
            .zip(values)
            .skip(lookback)
            .filter(|(_, v)| v.is_finite())
            .map(|(bar, &value)| IndicatorPoint {
                time: bar.time,
                value,
            })
            .collect();
        Self {
            kind,
            period,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<IndicatorPoint> {
        self.points.last().copied()
    }
}

/// Build the batch indicator for `kind`.
pub fn indicator(kind: IndicatorKind, period: usize) -> Result<Box<dyn Indicator>, IndicatorError> {
    Ok(match kind {
        IndicatorKind::MovingAverage => Box::new(Sma::new(period)?),
        IndicatorKind::Oscillator => Box::new(Rsi::new(period)?),
    })
}

/// Compute the full series for `kind` over `bars`.
///
/// A period longer than the data yields an empty series, not an error.
pub fn compute(
    kind: IndicatorKind,
    period: usize,
    bars: &[Bar],
) -> Result<IndicatorSeries, IndicatorError> {
    Ok(indicator(kind, period)?.series(bars))
}

/// Build the streaming indicator for `kind`.
pub fn stream(
    kind: IndicatorKind,
    period: usize,
) -> Result<Box<dyn IndicatorStream>, IndicatorError> {
    Ok(match kind {
        IndicatorKind::MovingAverage => Box::new(SmaStream::new(period)?),
        IndicatorKind::Oscillator => Box::new(RsiStream::new(period)?),
    })
}

pub(crate) fn check_period(period: usize) -> Result<usize, IndicatorError> {
    if period == 0 {
        Err(IndicatorError::InvalidPeriod(0))
    } else {
        Ok(period)
    }
}

/// Create bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high/low = body ± 1.0,
/// volume = 1000, one day apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_time = 1_704_153_600; // 2024-01-02
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                time: base_time + i as i64 * 86_400,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
