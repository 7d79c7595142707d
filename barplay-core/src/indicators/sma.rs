//! Simple Moving Average (SMA).
//!
//! Mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).
//!
//! Each window is summed afresh, oldest close first, so a huge close
//! affects only the windows that contain it.

use super::{check_period, Indicator, IndicatorError, IndicatorKind};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: check_period(period)?,
        })
    }
}

impl Indicator for Sma {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MovingAverage
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let divisor = self.period as f64;
        for (offset, window) in bars.windows(self.period).enumerate() {
            let sum: f64 = window.iter().map(|b| b.close).sum();
            result[offset + self.period - 1] = sum / divisor;
        }

        result
    }
}
