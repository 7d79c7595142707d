//! Candle chart widget with moving average overlay.
//!
//! Renders candlesticks using direct buffer writes:
//! - Each candle = 1 terminal column
//! - Body: block char, positive colour if close >= open, negative otherwise
//! - Wicks: vertical line chars to high/low
//! - Moving average: one dot per column at the overlay value

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use barplay_core::indicators::IndicatorPoint;
use barplay_core::Candle;

use crate::chart_view::value_at;
use crate::theme::Palette;

/// Width reserved for price labels.
const LABEL_WIDTH: u16 = 9;

pub struct CandleChartPanel<'a> {
    candles: &'a [Candle],
    moving_average: Option<(&'a [IndicatorPoint], usize)>,
    title: &'a str,
    palette: &'a Palette,
}

impl<'a> CandleChartPanel<'a> {
    pub fn new(candles: &'a [Candle], title: &'a str, palette: &'a Palette) -> Self {
        Self {
            candles,
            moving_average: None,
            title,
            palette,
        }
    }

    /// Draw a moving average line of the given period.
    pub fn moving_average(mut self, points: &'a [IndicatorPoint], period: usize) -> Self {
        self.moving_average = Some((points, period));
        self
    }

    fn ma_values(&self) -> Vec<Option<f64>> {
        match self.moving_average {
            Some((points, _)) => self
                .candles
                .iter()
                .map(|c| value_at(points, c.time))
                .collect(),
            None => vec![None; self.candles.len()],
        }
    }
}

/// Map a price to a Y position in the plot area (0 = top).
pub(crate) fn price_to_y(price: f64, y_min: f64, y_max: f64, plot_height: u16) -> u16 {
    if (y_max - y_min).abs() < 1e-9 || plot_height == 0 {
        return 0;
    }
    let frac = (price - y_min) / (y_max - y_min);
    let y = plot_height.saturating_sub(1) as f64 * (1.0 - frac);
    y.round().clamp(0.0, plot_height.saturating_sub(1) as f64) as u16
}

impl Widget for CandleChartPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        if self.candles.is_empty() {
            Block::default()
                .title(format!(" {} [No Data] ", self.title))
                .borders(Borders::ALL)
                .border_style(p.border(false))
                .style(p.base())
                .render(area, buf);
            return;
        }

        let ma = self.ma_values();

        // Price bounds cover the candles and the visible part of the MA.
        let (lo, hi) = self
            .candles
            .iter()
            .map(|c| (c.low, c.high))
            .chain(ma.iter().flatten().map(|&v| (v, v)))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (l, h)| {
                (lo.min(l), hi.max(h))
            });
        let range = hi - lo;
        let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
        let y_lower = lo - pad;
        let y_upper = hi + pad;

        let mut title = format!(" {} | {} bars ", self.title, self.candles.len());
        if let Some((_, period)) = self.moving_average {
            if let Some(v) = ma.iter().rev().flatten().next() {
                title.push_str(&format!("| MA({period}) {v:.2} "));
            } else {
                title.push_str(&format!("| MA({period}) - "));
            }
        }

        let block = Block::default()
            .title(title)
            .title_style(p.title())
            .borders(Borders::ALL)
            .border_style(p.border(true))
            .style(p.base());
        let inner = block.inner(area);
        block.render(area, buf);

        let plot_left = inner.x + LABEL_WIDTH;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let plot_height = inner.height;
        if plot_width == 0 || plot_height == 0 {
            return;
        }

        // Y-axis labels
        let y_labels = [y_upper, (y_upper + y_lower) / 2.0, y_lower];
        let y_positions = [0u16, plot_height / 2, plot_height.saturating_sub(1)];
        for (value, y_pos) in y_labels.iter().zip(y_positions) {
            buf.set_string(inner.x, plot_top + y_pos, format!("{value:>8.2}"), p.muted());
        }

        // The caller passes the visible window; clip anything wider.
        let start = self.candles.len().saturating_sub(plot_width as usize);
        for (i, candle) in self.candles[start..].iter().enumerate() {
            let x = plot_left + i as u16;
            let rising = candle.close >= candle.open;
            let style = Style::default().fg(p.candle_color(rising));

            let high_y = price_to_y(candle.high, y_lower, y_upper, plot_height);
            let low_y = price_to_y(candle.low, y_lower, y_upper, plot_height);
            let body_top = price_to_y(candle.open.max(candle.close), y_lower, y_upper, plot_height);
            let body_bot = price_to_y(candle.open.min(candle.close), y_lower, y_upper, plot_height);

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "│", style);
            }
            let body = if rising { "█" } else { "▓" };
            for y in body_top..=body_bot {
                buf.set_string(x, plot_top + y, body, style);
            }
            for y in (body_bot + 1)..=low_y {
                buf.set_string(x, plot_top + y, "│", style);
            }

            if let Some(v) = ma[start + i] {
                let y = price_to_y(v, y_lower, y_upper, plot_height);
                buf.set_string(
                    x,
                    plot_top + y,
                    "•",
                    Style::default().fg(p.ma_line).add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}
