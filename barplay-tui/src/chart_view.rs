//! The terminal's render sink.
//!
//! Holds exactly what the session last pushed: candles, volume and overlay
//! points. Widgets read from here at draw time; nothing is recomputed.

use std::collections::BTreeMap;

use barplay_core::indicators::{IndicatorKind, IndicatorPoint};
use barplay_core::{Candle, RenderSink, VolumeBar};

#[derive(Debug, Default)]
pub struct ChartView {
    candles: Vec<Candle>,
    volume: Vec<VolumeBar>,
    overlays: BTreeMap<IndicatorKind, Vec<IndicatorPoint>>,
    /// Bars scrolled back from the right edge. Zero follows the newest bar.
    scroll: usize,
}

impl ChartView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn volume(&self) -> &[VolumeBar] {
        &self.volume
    }

    pub fn overlay(&self, kind: IndicatorKind) -> Option<&[IndicatorPoint]> {
        self.overlays.get(&kind).map(|p| p.as_slice())
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_back(&mut self, by: usize) {
        self.scroll = (self.scroll + by).min(self.candles.len().saturating_sub(1));
    }

    pub fn scroll_forward(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }

    /// Index range of the candles that fit in `width` columns.
    pub fn window(&self, width: usize) -> std::ops::Range<usize> {
        let end = self.candles.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(width);
        start..end
    }
}

/// Look up an overlay value at an exact bar time. Points are in time order.
pub fn value_at(points: &[IndicatorPoint], time: i64) -> Option<f64> {
    points
        .binary_search_by_key(&time, |p| p.time)
        .ok()
        .map(|i| points[i].value)
}

impl RenderSink for ChartView {
    fn set_full_series(&mut self, candles: &[Candle], volume: &[VolumeBar]) {
        self.candles = candles.to_vec();
        self.volume = volume.to_vec();
        self.scroll = self.scroll.min(self.candles.len().saturating_sub(1));
    }

    fn append_bar(&mut self, candle: Candle, volume: VolumeBar) {
        self.candles.push(candle);
        self.volume.push(volume);
    }

    fn set_overlay_series(&mut self, kind: IndicatorKind, points: &[IndicatorPoint]) {
        self.overlays.insert(kind, points.to_vec());
    }

    fn clear_overlay(&mut self, kind: IndicatorKind) {
        self.overlays.remove(&kind);
    }
}
