//! Top-level layout: candles, volume, optional oscillator, status bar.

pub mod candle_chart;
pub mod oscillator;
pub mod prompt;
pub mod status_bar;
pub mod volume;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use barplay_core::indicators::IndicatorKind;
use barplay_core::replay::Clock;
use barplay_core::settings::SettingsStore;

use crate::app::{AppState, Overlay};

use self::candle_chart::CandleChartPanel;
use self::oscillator::OscillatorPanel;
use self::volume::VolumePanel;

const VOLUME_HEIGHT: u16 = 6;
const OSCILLATOR_HEIGHT: u16 = 8;
/// Borders plus price label column.
const CHROME_WIDTH: u16 = 11;

/// Draw the entire UI.
pub fn draw<S: SettingsStore, C: Clock>(f: &mut Frame, app: &AppState<S, C>) {
    let palette = app.palette();
    let settings = app.session.settings();
    let show_oscillator = settings.oscillator_enabled;

    let mut constraints = vec![Constraint::Min(5), Constraint::Length(VOLUME_HEIGHT)];
    if show_oscillator {
        constraints.push(Constraint::Length(OSCILLATOR_HEIGHT));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let chart_area = chunks[0];
    let volume_area = chunks[1];
    let status_area = chunks[chunks.len() - 1];

    let window = app
        .view
        .window(chart_area.width.saturating_sub(CHROME_WIDTH) as usize);
    let candles = &app.view.candles()[window.clone()];
    let volume = app.view.volume().get(window).unwrap_or(&[]);

    let title = app.source_label();
    let mut chart = CandleChartPanel::new(candles, &title, &palette);
    if settings.moving_average_enabled {
        if let Some(points) = app.view.overlay(IndicatorKind::MovingAverage) {
            chart = chart.moving_average(points, settings.moving_average_period);
        }
    }
    f.render_widget(chart, chart_area);
    f.render_widget(VolumePanel::new(volume, &palette), volume_area);

    if show_oscillator {
        let points = app.view.overlay(IndicatorKind::Oscillator).unwrap_or(&[]);
        f.render_widget(
            OscillatorPanel::new(candles, points, settings.oscillator_period, &palette),
            chunks[2],
        );
    }

    status_bar::render(f, status_area, app, &palette);

    let main_area = Rect {
        height: f.area().height.saturating_sub(1),
        ..f.area()
    };
    match &app.overlay {
        Overlay::Help => prompt::render_help(f, main_area, &palette),
        Overlay::ImportPrompt(input) => prompt::render_import(f, main_area, input, &palette),
        Overlay::None => {}
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::app::test_helpers::app;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn draws_chart_volume_and_status() {
        let (app, _) = app(60);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("DEMO 1D (sample)"));
        assert!(text.contains("Volume"));
        assert!(!text.contains("RSI("));
    }

    #[test]
    fn oscillator_pane_follows_setting() {
        let (mut app, _) = app(60);
        app.toggle_indicator(IndicatorKind::Oscillator);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen(&terminal).contains("RSI(14)"));
    }

    #[test]
    fn overlays_and_small_terminals_render() {
        let (mut app, _) = app(60);
        app.overlay = Overlay::Help;
        for (w, h) in [(100, 30), (20, 8), (4, 3)] {
            let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
            terminal.draw(|f| draw(f, &app)).unwrap();
        }
        app.overlay = Overlay::ImportPrompt("bars.csv".into());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen(&terminal).contains("bars.csv"));
    }

    #[test]
    fn replay_status_is_shown() {
        let (mut app, _) = app(60);
        app.session.step_forward(&mut app.view);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen(&terminal).contains("STOPPED 1/60 @ 100ms"));
    }
}
