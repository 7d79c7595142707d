//! Relative Strength Index (RSI): the chart's bounded 0–100 oscillator.
//!
//! Seed: plain average of the first `period` close-to-close gains and losses
//! (losses stored as positive magnitudes). After the seed, Wilder smoothing:
//! `avg = (avg * (period - 1) + x) / period`.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first value uses the period-th delta).
//! Edge case: avg_loss == 0 → RSI = 100, including a flat window.

use super::{check_period, Indicator, IndicatorError, IndicatorKind};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: check_period(period)?,
        })
    }
}

impl Indicator for Rsi {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Oscillator
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        let p = self.period as f64;

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let (gain, loss) = split_delta(bars[i].close - bars[i - 1].close);
            avg_gain += gain;
            avg_loss += loss;
        }
        avg_gain /= p;
        avg_loss /= p;
        result[self.period] = rsi_value(avg_gain, avg_loss);

        for i in (self.period + 1)..n {
            let (gain, loss) = split_delta(bars[i].close - bars[i - 1].close);
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
            result[i] = rsi_value(avg_gain, avg_loss);
        }

        result
    }
}

/// Split a close-to-close delta into (gain, loss), both non-negative.
pub(crate) fn split_delta(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else {
        (0.0, -delta)
    }
}

/// Map smoothed averages to the 0–100 scale.
///
/// Zero average loss maps to exactly 100 rather than dividing by zero.
pub(crate) fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let value = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    value.clamp(0.0, 100.0)
}
