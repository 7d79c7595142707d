//! Text output: indicator tables and the headless replay printer.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::DateTime;

use barplay_core::indicators::{IndicatorKind, IndicatorPoint};
use barplay_core::{Bar, Candle, RenderSink, VolumeBar};

fn lookup(points: &[IndicatorPoint], time: i64) -> Option<f64> {
    points
        .binary_search_by_key(&time, |p| p.time)
        .ok()
        .map(|i| points[i].value)
}

fn format_time(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

fn cell(value: Option<f64>, width: usize) -> String {
    match value {
        Some(v) => format!("{v:>width$.2}"),
        None => format!("{:>width$}", "-"),
    }
}

pub fn header() -> String {
    format!(
        "{:<16} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10} {:>8}",
        "time", "open", "high", "low", "close", "volume", "ma", "rsi"
    )
}

/// One table row; overlay columns show `-` before their first value.
pub fn row(time: i64, ohlc: [f64; 4], volume: f64, ma: Option<f64>, rsi: Option<f64>) -> String {
    let [open, high, low, close] = ohlc;
    format!(
        "{:<16} {open:>10.2} {high:>10.2} {low:>10.2} {close:>10.2} {volume:>12.0} {} {}",
        format_time(time),
        cell(ma, 10),
        cell(rsi, 8),
    )
}

/// Rows for every bar, with the overlay values that exist at its time.
pub fn indicator_table(bars: &[Bar], ma: &[IndicatorPoint], rsi: &[IndicatorPoint]) -> Vec<String> {
    bars.iter()
        .map(|b| {
            row(
                b.time,
                [b.open, b.high, b.low, b.close],
                b.volume,
                lookup(ma, b.time),
                lookup(rsi, b.time),
            )
        })
        .collect()
}

/// Render sink for headless replay: appended bars are buffered and written,
/// with their overlay values, on [`flush`](Self::flush).
pub struct PrintSink<W: Write> {
    out: W,
    pending: Vec<(Candle, VolumeBar)>,
    overlays: BTreeMap<IndicatorKind, Vec<IndicatorPoint>>,
    printed: usize,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: Vec::new(),
            overlays: BTreeMap::new(),
            printed: 0,
        }
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn flush(&mut self) -> io::Result<()> {
        let ma = self.overlays.get(&IndicatorKind::MovingAverage);
        let rsi = self.overlays.get(&IndicatorKind::Oscillator);
        for (candle, volume) in self.pending.drain(..) {
            let line = row(
                candle.time,
                [candle.open, candle.high, candle.low, candle.close],
                volume.value,
                ma.and_then(|p| lookup(p, candle.time)),
                rsi.and_then(|p| lookup(p, candle.time)),
            );
            writeln!(self.out, "{line}")?;
            self.printed += 1;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for PrintSink<W> {
    fn set_full_series(&mut self, _candles: &[Candle], _volume: &[VolumeBar]) {
        self.pending.clear();
    }

    fn append_bar(&mut self, candle: Candle, volume: VolumeBar) {
        self.pending.push((candle, volume));
    }

    fn set_overlay_series(&mut self, kind: IndicatorKind, points: &[IndicatorPoint]) {
        self.overlays.insert(kind, points.to_vec());
    }

    fn clear_overlay(&mut self, kind: IndicatorKind) {
        self.overlays.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                time: 1_704_153_600 + i as i64 * 86_400,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn table_marks_warmup_with_dash() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let ma = [IndicatorPoint { time: bars[2].time, value: 11.0 }];
        let rows = indicator_table(&bars, &ma, &[]);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].trim_end().ends_with('-'));
        assert!(rows[2].contains("11.00"));
    }

    #[test]
    fn print_sink_writes_on_flush_with_overlays() {
        let bars = make_bars(&[10.0, 12.0]);
        let mut sink = PrintSink::new(Vec::new());
        sink.append_bar(Candle::from(&bars[0]), VolumeBar::from(&bars[0]));
        sink.append_bar(Candle::from(&bars[1]), VolumeBar::from(&bars[1]));
        sink.set_overlay_series(
            IndicatorKind::Oscillator,
            &[IndicatorPoint { time: bars[1].time, value: 100.0 }],
        );
        assert_eq!(sink.printed(), 0);
        sink.flush().unwrap();
        assert_eq!(sink.printed(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("100.00"));
    }

    #[test]
    fn full_redraw_discards_pending_rows() {
        let bars = make_bars(&[10.0]);
        let mut sink = PrintSink::new(Vec::new());
        sink.append_bar(Candle::from(&bars[0]), VolumeBar::from(&bars[0]));
        sink.set_full_series(&[], &[]);
        sink.flush().unwrap();
        assert_eq!(sink.printed(), 0);
    }
}
