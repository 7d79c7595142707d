//! Volume histogram under the candles, one column per bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Widget},
};

use barplay_core::VolumeBar;

use crate::theme::Palette;

/// Eighth-block glyphs for sub-cell bar heights.
const PARTIAL: [&str; 8] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇"];

/// Column offset matching the candle chart's price labels.
const LABEL_WIDTH: u16 = 9;

pub struct VolumePanel<'a> {
    bars: &'a [VolumeBar],
    palette: &'a Palette,
}

impl<'a> VolumePanel<'a> {
    pub fn new(bars: &'a [VolumeBar], palette: &'a Palette) -> Self {
        Self { bars, palette }
    }
}

/// Height of one bar in eighths of a cell.
fn eighths(value: f64, max: f64, rows: u16) -> u32 {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value / max).clamp(0.0, 1.0) * f64::from(rows) * 8.0).round() as u32
}

fn compact(value: f64) -> String {
    match value {
        v if v >= 1e9 => format!("{:.1}B", v / 1e9),
        v if v >= 1e6 => format!("{:.1}M", v / 1e6),
        v if v >= 1e3 => format!("{:.1}K", v / 1e3),
        v => format!("{v:.0}"),
    }
}

impl Widget for VolumePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let block = Block::default()
            .title(" Volume ")
            .borders(Borders::ALL)
            .border_style(p.border(false))
            .style(p.base());
        let inner = block.inner(area);
        block.render(area, buf);

        let plot_left = inner.x + LABEL_WIDTH;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let rows = inner.height;
        if plot_width == 0 || rows == 0 || self.bars.is_empty() {
            return;
        }

        let start = self.bars.len().saturating_sub(plot_width as usize);
        let visible = &self.bars[start..];
        let max = visible.iter().map(|b| b.value).fold(0.0, f64::max);
        buf.set_string(inner.x, inner.y, format!("{:>8}", compact(max)), p.muted());

        for (i, bar) in visible.iter().enumerate() {
            let x = plot_left + i as u16;
            let style = Style::default().fg(p.candle_color(bar.rising));
            let mut remaining = eighths(bar.value, max, rows);
            for row in 0..rows {
                if remaining == 0 {
                    break;
                }
                let y = inner.y + rows - 1 - row;
                let glyph = if remaining >= 8 { "█" } else { PARTIAL[remaining as usize] };
                buf.set_string(x, y, glyph, style);
                remaining = remaining.saturating_sub(8);
            }
        }
    }
}
