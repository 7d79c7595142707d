//! Bar: the fundamental market data unit, and the ordered sequence a session owns.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one time interval.
///
/// `time` is Unix seconds. Bars are constructed once by a data source and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if every price and the volume is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// OHLC envelope check: `low <= min(open, close) <= max(open, close) <= high`.
    ///
    /// Well-formed input satisfies this, but malformed bars are tolerated
    /// everywhere in the crate; this is only used for reporting.
    pub fn is_well_formed(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.volume >= 0.0
    }

    /// True when the bar closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BarError {
    #[error("bar times must be strictly increasing: bar {index} has time {time}, previous bar has {previous}")]
    NotIncreasing { index: usize, time: i64, previous: i64 },
}

/// Ordered bars with strictly increasing, unique `time` values.
///
/// Backed by a shared slice: cloning hands the same bars to the replay
/// controller without copying them.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSequence {
    bars: Arc<[Bar]>,
}

impl BarSequence {
    /// Build a sequence, rejecting any pair of bars whose times do not strictly increase.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(BarError::NotIncreasing {
                    index: i + 1,
                    time: pair[1].time,
                    previous: pair[0].time,
                });
            }
        }
        Ok(Self { bars: bars.into() })
    }

    pub fn empty() -> Self {
        Self {
            bars: Vec::new().into(),
        }
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn first_time(&self) -> Option<i64> {
        self.bars.first().map(|b| b.time)
    }

    pub fn last_time(&self) -> Option<i64> {
        self.bars.last().map(|b| b.time)
    }

    /// True if both handles point at the same loaded data (not merely equal bars).
    pub fn same_data(&self, other: &BarSequence) -> bool {
        Arc::ptr_eq(&self.bars, &other.bars)
    }
}

impl Default for BarSequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for BarSequence {
    type Target = [Bar];

    fn deref(&self) -> &[Bar] {
        &self.bars
    }
}
