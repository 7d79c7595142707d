//! Synthetic bar generator.
//!
//! A seeded random walk: each bar opens at the previous close, moves by up to
//! ±2%, and wicks out up to 1% beyond its body. Used only when no user data is
//! available, so it is reproducible rather than cryptographically random.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BarSource, DataError, DataOrigin, LoadedBars};
use crate::domain::{Bar, BarSequence, Timeframe};

/// Everything that determines a synthetic dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSpec {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub count: usize,
    /// Time of the first bar, Unix seconds.
    pub start_time: i64,
    pub seed: u64,
}

/// Generate `spec.count` bars spaced by the timeframe.
pub fn generate(spec: &SyntheticSpec) -> BarSequence {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let step = spec.timeframe.seconds();
    let mut prev_close: f64 = rng.gen_range(50.0..250.0);
    let mut bars = Vec::with_capacity(spec.count);

    for i in 0..spec.count {
        let open = prev_close;
        let change: f64 = rng.gen_range(-0.02..0.02);
        let close = (open * (1.0 + change)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume: f64 = rng.gen_range(1_000.0..100_000.0);

        bars.push(Bar {
            time: spec.start_time + i as i64 * step,
            open: round_cents(open),
            high: round_cents(high),
            low: round_cents(low),
            close: round_cents(close),
            volume: volume.round(),
        });
        prev_close = close;
    }

    // Times are start + i * step with step > 0, so the sequence is ordered.
    BarSequence::new(bars).unwrap_or_default()
}

/// Rounding to cents can shift a value by at most half a cent, and rounding is
/// monotone, so the high/low envelope survives it.
fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A [`BarSource`] that never fails.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    spec: SyntheticSpec,
}

impl SyntheticSource {
    pub fn new(spec: SyntheticSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &SyntheticSpec {
        &self.spec
    }

    pub fn generate(&self) -> LoadedBars {
        LoadedBars {
            bars: generate(&self.spec),
            origin: DataOrigin::Synthetic {
                seed: self.spec.seed,
            },
        }
    }
}

impl BarSource for SyntheticSource {
    fn load(&self) -> Result<LoadedBars, DataError> {
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(count: usize, seed: u64) -> SyntheticSpec {
        SyntheticSpec {
            symbol: "DEMO".into(),
            timeframe: Timeframe::Day1,
            count,
            start_time: 1_704_153_600,
            seed,
        }
    }

    #[test]
    fn generates_requested_count_of_daily_bars() {
        let bars = generate(&spec(10, 1));
        assert_eq!(bars.len(), 10);
        for pair in bars.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, 86_400);
        }
    }

    #[test]
    fn open_is_previous_close() {
        let bars = generate(&spec(50, 3));
        for pair in bars.windows(2) {
            // Both sides are rounded from the same f64.
            assert_eq!(pair[1].open, pair[0].close);
        }
    }

    #[test]
    fn bars_are_well_formed() {
        let bars = generate(&spec(200, 9));
        assert!(bars.iter().all(|b| b.is_well_formed()));
        assert!(bars.iter().all(|b| b.volume >= 1_000.0));
    }

    #[test]
    fn same_seed_same_bars() {
        assert_eq!(generate(&spec(30, 5)), generate(&spec(30, 5)));
        assert_ne!(generate(&spec(30, 5)), generate(&spec(30, 6)));
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(generate(&spec(0, 1)).is_empty());
    }

    #[test]
    fn timeframe_sets_spacing() {
        let mut s = spec(3, 1);
        s.timeframe = Timeframe::Min15;
        let bars = generate(&s);
        assert_eq!(bars[1].time - bars[0].time, 900);
    }
}
