//! Bottom status bar: replay position, data source, last message, key hints.

use chrono::DateTime;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use barplay_core::replay::Clock;
use barplay_core::settings::SettingsStore;
use barplay_core::{ReplayStatus, ViewMode};

use crate::app::{AppState, StatusLevel};
use crate::theme::Palette;

/// Date of a bar for display; intraday bars keep the time of day.
pub(crate) fn format_time(unix_secs: i64) -> String {
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(dt) if unix_secs % 86_400 == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => unix_secs.to_string(),
    }
}

/// "PLAYING 12/300 @ 250ms" style summary of the replay position.
pub(crate) fn replay_summary(status: ReplayStatus, cursor: usize, total: usize, speed_ms: u64) -> String {
    format!("{} {cursor}/{total} @ {speed_ms}ms", status.label())
}

pub fn render<S: SettingsStore, C: Clock>(f: &mut Frame, area: Rect, app: &AppState<S, C>, palette: &Palette) {
    let session = &app.session;
    let mut spans: Vec<Span> = Vec::new();

    spans.push(Span::styled(
        format!(" {} ", app.source_label()),
        palette.title(),
    ));

    match session.view() {
        ViewMode::Full => {
            spans.push(Span::styled(
                format!("{} bars", session.bars().len()),
                palette.muted(),
            ));
        }
        ViewMode::Replay => {
            let state = session.replay_state();
            let style = match state.status {
                ReplayStatus::Playing => Style::default()
                    .fg(palette.positive)
                    .add_modifier(Modifier::BOLD),
                ReplayStatus::Paused => Style::default().fg(palette.warning),
                ReplayStatus::Stopped => palette.muted(),
            };
            spans.push(Span::styled(
                replay_summary(state.status, state.cursor, session.bars().len(), state.speed_ms),
                style,
            ));
            if let Some(last) = session.visible_bars().last() {
                spans.push(Span::styled(format!("  {}", format_time(last.time)), palette.muted()));
            }
        }
    }

    spans.push(Span::raw(" | "));

    if let Some((msg, level)) = &app.status_message {
        let color = match level {
            StatusLevel::Info => palette.accent,
            StatusLevel::Warning => palette.warning,
            StatusLevel::Error => palette.negative,
        };
        spans.push(Span::styled(msg.as_str(), Style::default().fg(color)));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled(
        "space:play ←/→:step +/-:speed ?:help q:quit",
        palette.muted(),
    ));

    let para = Paragraph::new(Line::from(spans)).style(palette.base());
    f.render_widget(para, area);
}
