//! Streaming indicators for replay.
//!
//! Each stream consumes bars one at a time and yields the value the batch
//! indicator would produce at that bar, using the same arithmetic order so the
//! two agree bit for bit.

use std::collections::VecDeque;

use super::rsi::{rsi_value, split_delta};
use super::{check_period, IndicatorError, IndicatorKind};
use crate::domain::Bar;

pub trait IndicatorStream: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    /// Feed the next bar; returns the indicator value at that bar once warm.
    fn push(&mut self, bar: &Bar) -> Option<f64>;

    /// Forget all history.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct SmaStream {
    period: usize,
    window: VecDeque<f64>,
}

impl SmaStream {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        let period = check_period(period)?;
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period),
        })
    }
}

impl IndicatorStream for SmaStream {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MovingAverage
    }

    fn push(&mut self, bar: &Bar) -> Option<f64> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(bar.close);

        if self.window.len() == self.period {
            // Same summation order as the batch SMA.
            let sum: f64 = self.window.iter().sum();
            Some(sum / self.period as f64)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

#[derive(Debug, Clone)]
pub struct RsiStream {
    period: usize,
    prev_close: Option<f64>,
    deltas_seen: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiStream {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: check_period(period)?,
            prev_close: None,
            deltas_seen: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        })
    }
}

impl IndicatorStream for RsiStream {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Oscillator
    }

    fn push(&mut self, bar: &Bar) -> Option<f64> {
        let prev = self.prev_close.replace(bar.close)?;
        let (gain, loss) = split_delta(bar.close - prev);
        let p = self.period as f64;
        self.deltas_seen += 1;

        if self.deltas_seen < self.period {
            self.avg_gain += gain;
            self.avg_loss += loss;
            return None;
        }

        if self.deltas_seen == self.period {
            self.avg_gain = (self.avg_gain + gain) / p;
            self.avg_loss = (self.avg_loss + loss) / p;
        } else {
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        }
        Some(rsi_value(self.avg_gain, self.avg_loss))
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.deltas_seen = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}
