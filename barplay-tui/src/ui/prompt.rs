//! Overlays drawn on top of the chart: key help and the import path prompt.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::theme::Palette;
use crate::ui::centered_rect;

const KEYS: &[(&str, &str)] = &[
    ("Space", "Play / pause replay"),
    ("← / →", "Step one bar back / forward"),
    ("Shift+← / →", "Scroll the chart"),
    ("Home / End", "Jump to first / last bar"),
    ("+ / -", "Faster / slower replay"),
    ("x / Esc", "Leave replay, show all bars"),
    ("m  [ ]", "Moving average on/off, period"),
    ("r  { }", "Oscillator on/off, period"),
    ("s", "Next symbol"),
    ("f", "Next timeframe"),
    ("t", "Light / dark theme"),
    ("o", "Import a CSV file"),
    ("q", "Quit"),
];

pub fn render_help(f: &mut Frame, area: Rect, palette: &Palette) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(true))
        .title(" Keys ")
        .title_style(palette.title())
        .style(palette.base());

    let mut lines: Vec<Line> = KEYS
        .iter()
        .map(|(keys, desc)| {
            Line::from(vec![
                Span::styled(format!("  {keys:>14}  "), Style::default().fg(palette.accent)),
                Span::styled(*desc, Style::default().fg(palette.text_secondary)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press any key to close",
        palette.muted(),
    )));

    f.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn render_import(f: &mut Frame, area: Rect, input: &str, palette: &Palette) {
    let popup = centered_rect(60, 20, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(true))
        .title(" Import CSV ")
        .title_style(palette.title())
        .style(palette.base());

    let text = vec![
        Line::from(Span::styled(
            "Path to a file with time, open, high, low, close[, volume] columns:",
            palette.muted(),
        )),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(palette.accent)),
            Span::styled(input, Style::default().fg(palette.text_primary)),
            Span::styled(
                "_",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ]),
        Line::from(Span::styled("Enter: import  Esc: cancel", palette.muted())),
    ];

    let para = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    f.render_widget(para, popup);
}
