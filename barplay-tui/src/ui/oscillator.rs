//! Oscillator pane: values on a fixed 0-100 scale with 30/70 guides.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Widget},
};

use barplay_core::indicators::IndicatorPoint;
use barplay_core::Candle;

use crate::chart_view::value_at;
use crate::theme::Palette;

const LABEL_WIDTH: u16 = 9;
const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

pub struct OscillatorPanel<'a> {
    /// Candles in view; one column each.
    candles: &'a [Candle],
    points: &'a [IndicatorPoint],
    period: usize,
    palette: &'a Palette,
}

impl<'a> OscillatorPanel<'a> {
    pub fn new(
        candles: &'a [Candle],
        points: &'a [IndicatorPoint],
        period: usize,
        palette: &'a Palette,
    ) -> Self {
        Self {
            candles,
            points,
            period,
            palette,
        }
    }
}

fn value_to_y(value: f64, rows: u16) -> u16 {
    let top = rows.saturating_sub(1) as f64;
    (top * (1.0 - value.clamp(0.0, 100.0) / 100.0)).round() as u16
}

impl Widget for OscillatorPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let title = match self.points.last() {
            Some(last) => format!(" RSI({}) {:.1} ", self.period, last.value),
            None => format!(" RSI({}) - ", self.period),
        };
        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(p.osc_line))
            .borders(Borders::ALL)
            .border_style(p.border(false))
            .style(p.base());
        let inner = block.inner(area);
        block.render(area, buf);

        let plot_left = inner.x + LABEL_WIDTH;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let rows = inner.height;
        if plot_width == 0 || rows == 0 {
            return;
        }

        for level in [OVERBOUGHT, OVERSOLD] {
            let y = inner.y + value_to_y(level, rows);
            buf.set_string(inner.x, y, format!("{level:>8.0}"), p.muted());
            for x in plot_left..plot_left + plot_width {
                if (x - plot_left) % 2 == 0 {
                    buf.set_string(x, y, "·", p.muted());
                }
            }
        }

        let start = self.candles.len().saturating_sub(plot_width as usize);
        for (i, candle) in self.candles[start..].iter().enumerate() {
            if let Some(v) = value_at(self.points, candle.time) {
                let x = plot_left + i as u16;
                let y = inner.y + value_to_y(v, rows);
                buf.set_string(x, y, "•", Style::default().fg(p.oscillator_color(v)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_fixed() {
        assert_eq!(value_to_y(100.0, 11), 0);
        assert_eq!(value_to_y(0.0, 11), 10);
        assert_eq!(value_to_y(50.0, 11), 5);
        assert_eq!(value_to_y(150.0, 11), 0);
    }

    #[test]
    fn title_shows_latest_value() {
        let palette = Palette::dark();
        let candles: Vec<Candle> = (0..3)
            .map(|t| Candle {
                time: t,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
            })
            .collect();
        let points = [
            IndicatorPoint { time: 1, value: 55.0 },
            IndicatorPoint { time: 2, value: 71.25 },
        ];
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        OscillatorPanel::new(&candles, &points, 14, &palette).render(area, &mut buf);
        let top: String = (0..area.width)
            .filter_map(|x| buf.cell((x, 0)).map(|c| c.symbol().to_string()))
            .collect();
        assert!(top.contains("RSI(14) 71.2") || top.contains("RSI(14) 71.3"));
    }
}
