//! Render adapter contract.
//!
//! The core never draws. It pushes fully computed series into a [`RenderSink`]:
//! bulk redraws, single-bar appends during replay, and indicator overlays.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::indicators::{IndicatorKind, IndicatorPoint};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBar {
    pub time: i64,
    pub value: f64,
    /// Direction of the bar this volume belongs to.
    pub rising: bool,
}

impl From<&Bar> for Candle {
    fn from(bar: &Bar) -> Self {
        Self {
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

impl From<&Bar> for VolumeBar {
    fn from(bar: &Bar) -> Self {
        Self {
            time: bar.time,
            value: bar.volume,
            rising: bar.is_up(),
        }
    }
}

pub fn candles(bars: &[Bar]) -> Vec<Candle> {
    bars.iter().map(Candle::from).collect()
}

pub fn volume_bars(bars: &[Bar]) -> Vec<VolumeBar> {
    bars.iter().map(VolumeBar::from).collect()
}

/// The drawing surface, as seen from the core.
pub trait RenderSink {
    /// Replace everything drawn with these candles and volume bars.
    fn set_full_series(&mut self, candles: &[Candle], volume: &[VolumeBar]);

    /// Add one candle and its volume bar to the right edge.
    fn append_bar(&mut self, candle: Candle, volume: VolumeBar);

    /// Replace one indicator overlay.
    fn set_overlay_series(&mut self, kind: IndicatorKind, points: &[IndicatorPoint]);

    /// Remove one indicator overlay.
    fn clear_overlay(&mut self, kind: IndicatorKind);
}

/// Push `bars` as a full redraw.
pub fn draw_bars(sink: &mut dyn RenderSink, bars: &[Bar]) {
    sink.set_full_series(&candles(bars), &volume_bars(bars));
}

/// A sink that keeps what it was given, plus a count of each call.
///
/// Used by tests and by headless front-ends.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub candles: Vec<Candle>,
    pub volume: Vec<VolumeBar>,
    pub overlays: BTreeMap<IndicatorKind, Vec<IndicatorPoint>>,
    /// Every candle received through `append_bar`, in call order.
    pub appended: Vec<Candle>,
    pub full_redraws: usize,
    pub overlay_updates: usize,
    pub overlay_clears: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self, kind: IndicatorKind) -> Option<&[IndicatorPoint]> {
        self.overlays.get(&kind).map(|v| v.as_slice())
    }
}

impl RenderSink for RecordingSink {
    fn set_full_series(&mut self, candles: &[Candle], volume: &[VolumeBar]) {
        self.candles = candles.to_vec();
        self.volume = volume.to_vec();
        self.full_redraws += 1;
    }

    fn append_bar(&mut self, candle: Candle, volume: VolumeBar) {
        self.candles.push(candle);
        self.volume.push(volume);
        self.appended.push(candle);
    }

    fn set_overlay_series(&mut self, kind: IndicatorKind, points: &[IndicatorPoint]) {
        self.overlays.insert(kind, points.to_vec());
        self.overlay_updates += 1;
    }

    fn clear_overlay(&mut self, kind: IndicatorKind) {
        self.overlays.remove(&kind);
        self.overlay_clears += 1;
    }
}
